use crate::error::{Error, Result};

// What the verifier keeps about an outsourced file: enough to rebuild the
// challenged index domain and the block anchors without the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    identifier: String,
    block_count: u64,
}

impl FileMetadata {
    pub fn new(identifier: impl Into<String>, block_count: u64) -> Result<Self> {
        let identifier = identifier.into();
        Self::check_identifier(&identifier)?;
        if block_count == 0 {
            return Err(Error::malformed("a file has at least one block"));
        }
        Ok(Self {
            identifier,
            block_count,
        })
    }

    /// Identifiers are stored on one line of the file info.
    pub fn check_identifier(identifier: &str) -> Result<()> {
        if identifier.contains(['\n', '\r']) {
            return Err(Error::malformed("file identifier must be a single line"));
        }
        Ok(())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    // identifier line, then the block count in decimal
    pub fn to_text(&self) -> String {
        format!("{}\n{}\n", self.identifier, self.block_count)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let identifier = lines
            .next()
            .ok_or_else(|| Error::malformed("file info is empty"))?;
        let count = lines
            .next()
            .ok_or_else(|| Error::malformed("file info lacks a block count"))?
            .trim();
        let block_count = count
            .parse()
            .map_err(|_| Error::malformed(format!("block count {count:?} is not a number")))?;
        Self::new(identifier, block_count)
    }
}
