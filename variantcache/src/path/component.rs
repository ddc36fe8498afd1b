use std::fmt::{self, Debug};

/// A single, validated path component (the name of one node).
/// Disallows slashes and null bytes, as well as '.', '..' and the empty
/// string.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathComponent {
    inner: String,
}

/// Errors created when parsing a name into a [PathComponent].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathComponentError {
    #[error("cannot be empty")]
    Empty,
    #[error("cannot contain null bytes")]
    Null,
    #[error("cannot be '.' or '..'")]
    Dot,
    #[error("cannot contain slashes")]
    Slashes,
}

fn validate_name(name: &str) -> Result<(), PathComponentError> {
    match name {
        "" => Err(PathComponentError::Empty),
        "." | ".." => Err(PathComponentError::Dot),
        _ if name.contains('\0') => Err(PathComponentError::Null),
        _ if name.contains('/') => Err(PathComponentError::Slashes),
        _ => Ok(()),
    }
}

impl PathComponent {
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl TryFrom<&str> for PathComponent {
    type Error = PathComponentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_name(value)?;
        Ok(Self {
            inner: value.to_owned(),
        })
    }
}

impl Debug for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&self.inner, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{PathComponent, PathComponentError};
    use rstest::rstest;

    #[rstest]
    #[case::empty("", PathComponentError::Empty)]
    #[case::dot(".", PathComponentError::Dot)]
    #[case::dotdot("..", PathComponentError::Dot)]
    #[case::null("a\0b", PathComponentError::Null)]
    #[case::slash("a/b", PathComponentError::Slashes)]
    fn invalid_names(#[case] name: &str, #[case] err: PathComponentError) {
        assert_eq!(Err(err), PathComponent::try_from(name));
    }

    #[rstest]
    #[case::simple("src")]
    #[case::hidden(".project")]
    #[case::spaces("My Documents")]
    fn valid_names(#[case] name: &str) {
        let c = PathComponent::try_from(name).expect("must succeed");
        assert_eq!(name, c.as_str());
    }
}
