use maddy_client::StagedFile;

/// Stable identifier for one transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Bytes behind one image preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Picked locally and not uploaded yet; decoded asynchronously.
    Raw(StagedFile),
    /// Echoed back by the server; decoded synchronously.
    Base64(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub source: ImageSource,
}

impl ImageRef {
    pub fn raw(file: StagedFile) -> Self {
        Self {
            name: file.name().to_string(),
            source: ImageSource::Raw(file),
        }
    }

    pub fn base64(name: impl Into<String>, encoded: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ImageSource::Base64(encoded.into()),
        }
    }
}

/// Display-only document reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
}

impl FileRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Display-only audio reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attachments {
    pub images: Vec<ImageRef>,
    pub files: Vec<FileRef>,
    pub audio: Option<AudioRef>,
}

impl Attachments {
    /// Snapshot of staged uploads as they will be shown once sent.
    pub fn from_staged(files: &[StagedFile], images: &[StagedFile]) -> Self {
        Self {
            images: images.iter().cloned().map(ImageRef::raw).collect(),
            files: files.iter().map(|file| FileRef::new(file.name())).collect(),
            audio: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.files.is_empty() && self.audio.is_none()
    }
}

/// One chat message. Never edited once appended to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub author: String,
    pub text: String,
    pub is_user: bool,
    pub attachments: Option<Attachments>,
}

impl Message {
    pub fn new(
        id: MessageId,
        author: impl Into<String>,
        text: impl Into<String>,
        is_user: bool,
        attachments: Option<Attachments>,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            text: text.into(),
            is_user,
            attachments: attachments.filter(|attachments| !attachments.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_snapshot_keeps_order_and_names() {
        let files = vec![
            StagedFile::from_bytes("b.txt", b"1".to_vec()),
            StagedFile::from_bytes("a.pdf", b"2".to_vec()),
        ];
        let images = vec![StagedFile::from_bytes("cat.png", b"3".to_vec())];

        let attachments = Attachments::from_staged(&files, &images);
        let names: Vec<_> = attachments.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.txt", "a.pdf"]);
        assert_eq!(attachments.images[0].name, "cat.png");
        assert!(matches!(attachments.images[0].source, ImageSource::Raw(_)));
    }

    #[test]
    fn empty_attachments_are_dropped() {
        let message = Message::new(
            MessageId::new(1),
            "You",
            "hi",
            true,
            Some(Attachments::default()),
        );
        assert_eq!(message.attachments, None);
    }
}
