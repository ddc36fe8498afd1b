use bytes::Bytes;
use data_encoding::HEXLOWER;

/// Opaque bytes identifying one revision of a remote variant of a node.
/// Equality is byte-wise. An empty descriptor is a valid descriptor, absence
/// is tracked by [CacheEntry::Absent].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteDescriptor(Bytes);

impl ByteDescriptor {
    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Bytes> for ByteDescriptor {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

impl From<Vec<u8>> for ByteDescriptor {
    fn from(value: Vec<u8>) -> Self {
        Self(value.into())
    }
}

impl From<&'static [u8]> for ByteDescriptor {
    fn from(value: &'static [u8]) -> Self {
        Self(Bytes::from_static(value))
    }
}

impl From<&'static str> for ByteDescriptor {
    fn from(value: &'static str) -> Self {
        Self(Bytes::from_static(value.as_bytes()))
    }
}

impl From<ByteDescriptor> for Bytes {
    fn from(value: ByteDescriptor) -> Self {
        value.0
    }
}

impl AsRef<[u8]> for ByteDescriptor {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Display for ByteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", HEXLOWER.encode(&self.0))
    }
}

impl std::fmt::Debug for ByteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteDescriptor({})", HEXLOWER.encode(&self.0))
    }
}

/// What a byte store knows about a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CacheEntry {
    /// Never fetched.
    #[default]
    Unknown,
    /// The remote side confirmed there is no variant.
    Absent,
    Present(ByteDescriptor),
}

impl CacheEntry {
    pub fn is_known(&self) -> bool {
        !matches!(self, CacheEntry::Unknown)
    }

    pub fn bytes(&self) -> Option<&ByteDescriptor> {
        match self {
            CacheEntry::Present(bytes) => Some(bytes),
            CacheEntry::Unknown | CacheEntry::Absent => None,
        }
    }

    pub fn into_bytes(self) -> Option<ByteDescriptor> {
        match self {
            CacheEntry::Present(bytes) => Some(bytes),
            CacheEntry::Unknown | CacheEntry::Absent => None,
        }
    }
}
