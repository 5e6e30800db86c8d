//! Snapshots of a document's visible content and causal knowledge.
//!
//! A [`DocState`] holds each container's visible payloads plus the version
//! vector. Its JSON form is
//!
//! ```text
//! { "containers": { "<name>": [payload, ...] }, "version": { "<site>": counter } }
//! ```

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::StateError;
use crate::version::VersionVector;

/// Visible content of every container plus the version vector.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(deserialize = "T: serde::Deserialize<'de>")))]
pub struct DocState<T> {
    /// Visible payloads per container, in container order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub containers: BTreeMap<String, Vec<T>>,
    /// Causal knowledge at snapshot time.
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: VersionVector,
}

impl<T> Default for DocState<T> {
    fn default() -> Self {
        Self {
            containers: BTreeMap::new(),
            version: VersionVector::new(),
        }
    }
}

impl<T> DocState<T> {
    /// Check that every version entry names a site and a positive counter.
    pub fn validate(&self) -> Result<(), StateError> {
        match self
            .version
            .iter()
            .find(|(site, counter)| site.is_empty() || *counter == 0)
        {
            Some((site, counter)) => Err(StateError::InvalidVersion {
                site: site.into(),
                counter,
            }),
            None => Ok(()),
        }
    }

    /// Number of payloads across all containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.values().map(Vec::len).sum()
    }

    /// Whether no container holds a payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> DocState<T> {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, StateError> {
        serde_json::to_string(self).map_err(malformed)
    }
}

#[cfg(feature = "serde")]
impl<T: serde::de::DeserializeOwned> DocState<T> {
    /// Decode and validate a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let state: Self = serde_json::from_str(json).map_err(malformed)?;
        state.validate()?;
        Ok(state)
    }
}

/// Decode and validate a JSON [`Update`](crate::Update) record.
#[cfg(feature = "serde")]
pub fn decode_update<T: serde::de::DeserializeOwned>(
    json: &str,
) -> Result<crate::update::Update<T>, StateError> {
    let update: crate::update::Update<T> = serde_json::from_str(json).map_err(malformed)?;
    update.validate()?;
    Ok(update)
}

#[cfg(feature = "serde")]
fn malformed(err: serde_json::Error) -> StateError {
    StateError::Malformed(alloc::string::ToString::to_string(&err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_site() {
        let state: DocState<u8> = DocState {
            containers: BTreeMap::new(),
            version: [("", 1)].into_iter().collect(),
        };
        assert_eq!(
            state.validate(),
            Err(StateError::InvalidVersion {
                site: "".into(),
                counter: 1
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejects_zero_counter() {
        let json = r#"{"containers":{},"version":{"s1":0}}"#;
        assert_eq!(
            DocState::<u8>::from_json(json),
            Err(StateError::InvalidVersion {
                site: "s1".into(),
                counter: 0
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_shape() {
        let mut state: DocState<String> = DocState::default();
        state
            .containers
            .insert("list".into(), alloc::vec!["A".into(), "B".into()]);
        state.version.update("s1", 2);

        let json = state.to_json().unwrap();
        assert_eq!(json, r#"{"containers":{"list":["A","B"]},"version":{"s1":2}}"#);
        assert_eq!(DocState::<String>::from_json(&json).unwrap(), state);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn malformed_json() {
        assert!(matches!(
            DocState::<String>::from_json("{\"containers\": 3}"),
            Err(StateError::Malformed(_))
        ));
        assert!(matches!(
            DocState::<String>::from_json("not json"),
            Err(StateError::Malformed(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn update_without_item_is_rejected() {
        let json = r#"{"type":"insert","containerName":"list","index":0,"originSite":"s1","counter":1}"#;
        assert!(matches!(
            decode_update::<String>(json),
            Err(StateError::InvalidItem(_))
        ));
    }
}
