use url::Url;

use super::{ByteStore, SessionByteStoreConfig};
use crate::Error;

/// Describes a [ByteStore] that can be built without further collaborators.
///
/// Deserializes from an internally tagged representation, e.g.
/// `{"type": "memory"}`.
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ByteStoreConfig {
    Memory(SessionByteStoreConfig),
}

impl ByteStoreConfig {
    pub fn build(&self) -> Box<dyn ByteStore> {
        match self {
            ByteStoreConfig::Memory(config) => Box::new(config.build()),
        }
    }
}

impl TryFrom<Url> for ByteStoreConfig {
    type Error = Error;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        match url.scheme() {
            "memory" => Ok(ByteStoreConfig::Memory(SessionByteStoreConfig::try_from(
                url,
            )?)),
            scheme => Err(Error::InvalidRequest(format!(
                "unknown scheme: {}",
                scheme
            ))),
        }
    }
}

/// Constructs a new instance of a [ByteStore] from an URI.
///
/// The following URIs are supported:
/// - `memory:`
///   Uses a [super::SessionByteStore], which keeps everything in memory.
///
/// A [super::DescendantTree] can't be constructed from an URI, as it needs
/// the stores it's composed of and a descent predicate.
pub fn from_addr(uri: &str) -> Result<Box<dyn ByteStore>, Error> {
    let url = Url::parse(uri)?;
    Ok(ByteStoreConfig::try_from(url)?.build())
}

#[cfg(test)]
mod tests {
    use super::{from_addr, ByteStoreConfig};
    use crate::bytestore::SessionByteStoreConfig;
    use rstest::rstest;

    #[rstest]
    /// This uses the correct scheme, and doesn't specify a path.
    #[case::memory_valid("memory://", true)]
    /// This sets a memory url host to `foo`
    #[case::memory_invalid_host("memory://foo", false)]
    /// This sets a memory url path to "/", which is invalid.
    #[case::memory_invalid_root_path("memory:///", false)]
    /// This sets a memory url path to "/foo", which is invalid.
    #[case::memory_invalid_root_path_foo("memory:///foo", false)]
    /// Unknown scheme
    #[case::unknown_scheme("redis://localhost", false)]
    /// Not an url at all
    #[case::garbage("memory", false)]
    fn test_from_addr(#[case] uri_str: &str, #[case] exp_succeed: bool) {
        if exp_succeed {
            from_addr(uri_str).expect("should succeed");
        } else {
            assert!(from_addr(uri_str).is_err(), "should fail");
        }
    }

    #[test]
    fn deserialize_config() {
        let config: ByteStoreConfig =
            serde_json::from_value(serde_json::json!({ "type": "memory" })).expect("must parse");
        assert_eq!(ByteStoreConfig::Memory(SessionByteStoreConfig {}), config);

        serde_json::from_value::<ByteStoreConfig>(serde_json::json!({
            "type": "memory",
            "path": "/tmp/foo"
        }))
        .expect_err("unknown fields must be rejected");
    }
}
