use maddy_client::StagedFile;

/// Document types the chat server can extract text from.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "html", "css", "json", "xml", "csv", "log", "pdf", "docx", "doc",
    "xlsx", "xls",
];

/// Request body limit enforced by the chat server.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipKind {
    File,
    Image,
}

/// One dismissible preview entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub kind: ChipKind,
    pub index: usize,
    pub label: String,
}

/// Files and images picked but not yet sent.
///
/// Only the send pipeline clears staging, and only after a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStaging {
    files: Vec<StagedFile>,
    images: Vec<StagedFile>,
}

impl UploadStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the staged documents with a new picker selection.
    ///
    /// Returns the names that were not accepted.
    pub fn set_files(&mut self, selection: Vec<StagedFile>) -> Vec<String> {
        let (accepted, rejected) = partition(selection, is_document);
        self.files = accepted;
        rejected
    }

    /// Replaces the staged images with a new picker selection.
    pub fn set_images(&mut self, selection: Vec<StagedFile>) -> Vec<String> {
        let (accepted, rejected) = partition(selection, StagedFile::is_image);
        self.images = accepted;
        rejected
    }

    pub fn remove_file_at(&mut self, index: usize) -> Option<StagedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn remove_image_at(&mut self, index: usize) -> Option<StagedFile> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// Chips for the preview region, or `None` when the region is hidden.
    pub fn preview(&self) -> Option<Vec<Chip>> {
        if self.is_empty() {
            return None;
        }

        let files = self.files.iter().enumerate().map(|(index, file)| Chip {
            kind: ChipKind::File,
            index,
            label: file.name().to_string(),
        });
        let images = self.images.iter().enumerate().map(|(index, image)| Chip {
            kind: ChipKind::Image,
            index,
            label: image.name().to_string(),
        });
        Some(files.chain(images).collect())
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn images(&self) -> &[StagedFile] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.images.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files
            .iter()
            .chain(&self.images)
            .map(StagedFile::size)
            .sum()
    }

    /// Empties both lists, resetting the pickers along with them.
    pub(crate) fn clear(&mut self) {
        self.files.clear();
        self.images.clear();
    }
}

fn is_document(file: &StagedFile) -> bool {
    file.extension()
        .is_some_and(|extension| DOCUMENT_EXTENSIONS.contains(&extension.as_str()))
}

fn partition(
    selection: Vec<StagedFile>,
    accept: impl Fn(&StagedFile) -> bool,
) -> (Vec<StagedFile>, Vec<String>) {
    let mut accepted = Vec::with_capacity(selection.len());
    let mut rejected = Vec::new();
    for file in selection {
        if accept(&file) {
            accepted.push(file);
        } else {
            rejected.push(file.name().to_string());
        }
    }
    (accepted, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(name: &str, size: usize) -> StagedFile {
        StagedFile::from_bytes(name, vec![0_u8; size])
    }

    #[test]
    fn picker_selection_replaces_everything() {
        let mut staging = UploadStaging::new();
        staging.set_files(vec![staged("a.txt", 1), staged("b.md", 1)]);
        staging.set_files(vec![staged("c.pdf", 1)]);

        let names: Vec<_> = staging.files().iter().map(StagedFile::name).collect();
        assert_eq!(names, ["c.pdf"]);
    }

    #[test]
    fn unsupported_types_are_reported() {
        let mut staging = UploadStaging::new();
        let rejected = staging.set_files(vec![staged("notes.TXT", 1), staged("tool.exe", 1)]);
        assert_eq!(rejected, ["tool.exe"]);
        assert_eq!(staging.files().len(), 1);

        let rejected = staging.set_images(vec![staged("cat.jpg", 1), staged("cat.txt", 1)]);
        assert_eq!(rejected, ["cat.txt"]);
        assert_eq!(staging.images()[0].name(), "cat.jpg");
    }

    #[test]
    fn remove_shifts_and_ignores_out_of_range() {
        let mut staging = UploadStaging::new();
        staging.set_images(vec![staged("a.png", 1), staged("b.png", 1), staged("c.png", 1)]);

        let removed = staging.remove_image_at(1).expect("in range");
        assert_eq!(removed.name(), "b.png");
        assert_eq!(staging.remove_image_at(5), None);
        assert_eq!(staging.remove_file_at(0), None);

        let names: Vec<_> = staging.images().iter().map(StagedFile::name).collect();
        assert_eq!(names, ["a.png", "c.png"]);
    }

    #[test]
    fn preview_hides_when_empty() {
        let mut staging = UploadStaging::new();
        assert_eq!(staging.preview(), None);

        staging.set_files(vec![staged("a.csv", 4)]);
        staging.set_images(vec![staged("b.gif", 6)]);
        let chips = staging.preview().expect("visible");
        assert_eq!(
            chips,
            vec![
                Chip {
                    kind: ChipKind::File,
                    index: 0,
                    label: "a.csv".to_string(),
                },
                Chip {
                    kind: ChipKind::Image,
                    index: 0,
                    label: "b.gif".to_string(),
                },
            ]
        );
        assert_eq!(staging.total_bytes(), 10);

        staging.clear();
        assert_eq!(staging.preview(), None);
    }
}
