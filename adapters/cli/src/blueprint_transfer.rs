//! Single-line text form of a turret blueprint, suitable for sharing loadouts.

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use typing_defense_engine::TurretBlueprint;

const BLUEPRINT_DOMAIN: &str = "td";
const BLUEPRINT_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Encodes a blueprint as `td:v1:<base64 json>`.
pub(crate) fn encode(blueprint: &TurretBlueprint) -> Result<String, BlueprintTransferError> {
    let json = serde_json::to_vec(blueprint).map_err(BlueprintTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{BLUEPRINT_DOMAIN}{FIELD_DELIMITER}{BLUEPRINT_VERSION}{FIELD_DELIMITER}{encoded}"
    ))
}

/// Decodes a blueprint previously produced by [`encode`].
pub(crate) fn decode(value: &str) -> Result<TurretBlueprint, BlueprintTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BlueprintTransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().ok_or(BlueprintTransferError::MissingPrefix)?;
    let version = parts
        .next()
        .ok_or(BlueprintTransferError::MissingVersion)?;
    let payload = parts
        .next()
        .filter(|payload| !payload.is_empty())
        .ok_or(BlueprintTransferError::MissingPayload)?;

    if domain != BLUEPRINT_DOMAIN {
        return Err(BlueprintTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != BLUEPRINT_VERSION {
        return Err(BlueprintTransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(BlueprintTransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(BlueprintTransferError::InvalidPayload)
}

/// Errors raised while reading or writing blueprint transfer strings.
#[derive(Debug)]
pub(crate) enum BlueprintTransferError {
    /// The string was empty or whitespace.
    EmptyPayload,
    /// No domain segment.
    MissingPrefix,
    /// No version segment.
    MissingVersion,
    /// No payload segment.
    MissingPayload,
    /// The domain segment was not `td`.
    InvalidPrefix(String),
    /// The version segment is not understood by this build.
    UnsupportedVersion(String),
    /// The payload was not valid base64.
    InvalidEncoding(base64::DecodeError),
    /// The payload was not a blueprint document.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for BlueprintTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "blueprint string is empty"),
            Self::MissingPrefix => {
                write!(f, "blueprint string is missing the '{BLUEPRINT_DOMAIN}' prefix")
            }
            Self::MissingVersion => write!(f, "blueprint string is missing a version"),
            Self::MissingPayload => write!(f, "blueprint string is missing its payload"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "expected prefix '{BLUEPRINT_DOMAIN}', found '{prefix}'")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported blueprint version '{version}'")
            }
            Self::InvalidEncoding(error) => write!(f, "blueprint payload is not base64: {error}"),
            Self::InvalidPayload(error) => write!(f, "blueprint payload is malformed: {error}"),
        }
    }
}

impl Error for BlueprintTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typing_defense_core::{SlotId, TargetingPriority, TurretTypeId};
    use typing_defense_engine::BlueprintEntry;

    fn loadout() -> TurretBlueprint {
        TurretBlueprint::new()
            .with_slot(
                SlotId::new(1),
                BlueprintEntry::new(TurretTypeId::new("arrow"), 2)
                    .with_priority(TargetingPriority::Strongest),
            )
            .with_slot(
                SlotId::new(3),
                BlueprintEntry::new(TurretTypeId::new("flame"), 1),
            )
    }

    #[test]
    fn encoded_blueprint_decodes_to_the_same_loadout() {
        let blueprint = loadout();
        let encoded = encode(&blueprint).expect("encode");

        assert!(encoded.starts_with("td:v1:"));
        assert!(!encoded.contains('\n'));
        assert_eq!(decode(&encoded).expect("decode"), blueprint);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let encoded = encode(&loadout()).expect("encode");

        let decoded = decode(&format!("  {encoded}\n")).expect("decode");

        assert_eq!(decoded, loadout());
    }

    #[test]
    fn rejects_empty_and_truncated_strings() {
        assert!(matches!(decode("   "), Err(BlueprintTransferError::EmptyPayload)));
        assert!(matches!(decode("td"), Err(BlueprintTransferError::MissingVersion)));
        assert!(matches!(decode("td:v1:"), Err(BlueprintTransferError::MissingPayload)));
    }

    #[test]
    fn rejects_foreign_prefix_and_version() {
        let encoded = encode(&loadout()).expect("encode");
        let payload = encoded.trim_start_matches("td:v1:");

        assert!(matches!(
            decode(&format!("tower:v1:{payload}")),
            Err(BlueprintTransferError::InvalidPrefix(prefix)) if prefix == "tower"
        ));
        assert!(matches!(
            decode(&format!("td:v9:{payload}")),
            Err(BlueprintTransferError::UnsupportedVersion(version)) if version == "v9"
        ));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(matches!(
            decode("td:v1:@@@"),
            Err(BlueprintTransferError::InvalidEncoding(_))
        ));
        let not_a_blueprint = STANDARD_NO_PAD.encode(b"[1,2,3]");
        assert!(matches!(
            decode(&format!("td:v1:{not_a_blueprint}")),
            Err(BlueprintTransferError::InvalidPayload(_))
        ));
    }
}
