//! Component entries and their announcement codec
//!
//! A `ComponentEntry` is an immutable description of one installed component,
//! the permission set it declares, and where it came from. Shared local entries
//! carry the exact announcement string that is published as a node property;
//! remote entries carry the string as received.

use crate::authorization::{AccessGroup, PermissionSet};
use crate::error::CodecError;
use crate::types::ComponentId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Display name used for entries whose descriptor could not be read
pub const INACCESSIBLE_DISPLAY_NAME: &str = "Inaccessible component";

/// Interface part of a component descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInterface {
    #[serde(default)]
    pub identifier_and_version: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Revision part of a component descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRevision {
    #[serde(default)]
    pub component_interface: Option<ComponentInterface>,
    #[serde(default)]
    pub class_name: Option<String>,
}

/// Component installation descriptor as exchanged between nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstallation {
    pub installation_id: String,
    pub node_id: String,
    #[serde(default)]
    pub component_revision: Option<ComponentRevision>,
    #[serde(default)]
    pub maximum_count_of_parallel_instances: Option<u32>,
}

impl ComponentInstallation {
    /// Build a fully populated descriptor
    pub fn new(
        installation_id: impl Into<String>,
        node_id: impl Into<String>,
        identifier_and_version: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let identifier_and_version = identifier_and_version.into();
        let version = identifier_and_version
            .rsplit_once('/')
            .map(|(_, v)| v.to_string());
        Self {
            installation_id: installation_id.into(),
            node_id: node_id.into(),
            component_revision: Some(ComponentRevision {
                component_interface: Some(ComponentInterface {
                    identifier_and_version: Some(identifier_and_version),
                    display_name: Some(display_name.into()),
                    group_name: None,
                    version,
                }),
                class_name: None,
            }),
            maximum_count_of_parallel_instances: None,
        }
    }

    pub fn interface(&self) -> Option<&ComponentInterface> {
        self.component_revision
            .as_ref()
            .and_then(|r| r.component_interface.as_ref())
    }

    pub fn identifier_and_version(&self) -> Option<&str> {
        self.interface()
            .and_then(|i| i.identifier_and_version.as_deref())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.interface().and_then(|i| i.display_name.as_deref())
    }
}

/// Wire envelope of a published component entry
///
/// `authGroups == null` means public access.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnouncementEnvelope {
    #[serde(default)]
    auth_groups: Option<Vec<AccessGroup>>,
    data: String,
}

/// Envelope contents after the first decoding step
#[derive(Debug, Clone)]
pub struct DecodedAnnouncement {
    pub declared_permissions: PermissionSet,
    pub data: String,
}

/// Serialize an installation and its permission set into the announcement format
pub fn encode_announcement(
    installation: &ComponentInstallation,
    permissions: &PermissionSet,
) -> Result<String, CodecError> {
    let data = serde_json::to_string(installation).map_err(CodecError::Serialize)?;
    let auth_groups = if permissions.is_public() {
        None
    } else {
        Some(permissions.groups().cloned().collect())
    };
    serde_json::to_string(&AnnouncementEnvelope { auth_groups, data }).map_err(CodecError::Serialize)
}

/// Decode the announcement envelope without touching the descriptor
pub fn decode_announcement(raw: &str) -> Result<DecodedAnnouncement, CodecError> {
    let envelope: AnnouncementEnvelope =
        serde_json::from_str(raw).map_err(CodecError::Envelope)?;
    let declared_permissions = match envelope.auth_groups {
        None => PermissionSet::public(),
        Some(groups) => PermissionSet::from_groups(groups),
    };
    Ok(DecodedAnnouncement {
        declared_permissions,
        data: envelope.data,
    })
}

/// Decode the component descriptor carried in an envelope
pub fn decode_installation(data: &str) -> Result<ComponentInstallation, CodecError> {
    serde_json::from_str(data).map_err(CodecError::Descriptor)
}

/// Origin classification of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    /// Local installation with a local-only permission set
    Local,
    /// Local installation whose publication is prevented regardless of permissions
    ForcedLocal,
    /// Local installation published to other nodes
    Shared,
    /// Installation announced by another node
    Remote,
}

impl OriginType {
    pub fn is_local(self) -> bool {
        !matches!(self, OriginType::Remote)
    }

    pub fn is_shared(self) -> bool {
        matches!(self, OriginType::Shared)
    }
}

/// Immutable description of one known component installation
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEntry {
    component_id: ComponentId,
    declared_permissions: PermissionSet,
    origin: OriginType,
    payload: Option<Arc<ComponentInstallation>>,
    serialized_form: Option<Arc<str>>,
}

impl ComponentEntry {
    /// Classify a local installation and prepare its publication data
    ///
    /// Local-only permission sets yield `Local`; `allow_publication == false`
    /// yields `ForcedLocal`; everything else is `Shared` and gets serialized.
    pub fn local(
        installation: ComponentInstallation,
        permissions: PermissionSet,
        allow_publication: bool,
    ) -> Result<Self, CodecError> {
        let origin = if permissions.is_local_only() {
            OriginType::Local
        } else if !allow_publication {
            OriginType::ForcedLocal
        } else {
            OriginType::Shared
        };
        let serialized_form = if origin.is_shared() {
            Some(Arc::from(encode_announcement(&installation, &permissions)?))
        } else {
            None
        };
        Ok(Self {
            component_id: installation.installation_id.clone(),
            declared_permissions: permissions,
            origin,
            payload: Some(Arc::new(installation)),
            serialized_form,
        })
    }

    /// Entry for an announcement received from another node
    pub fn remote(
        component_id: impl Into<ComponentId>,
        declared_permissions: PermissionSet,
        payload: Option<ComponentInstallation>,
        serialized_form: &str,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            declared_permissions,
            origin: OriginType::Remote,
            payload: payload.map(Arc::new),
            serialized_form: Some(Arc::from(serialized_form)),
        }
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn declared_permissions(&self) -> &PermissionSet {
        &self.declared_permissions
    }

    pub fn origin(&self) -> OriginType {
        self.origin
    }

    pub fn payload(&self) -> Option<&ComponentInstallation> {
        self.payload.as_deref()
    }

    pub fn serialized_form(&self) -> Option<&str> {
        self.serialized_form.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.payload()
            .and_then(ComponentInstallation::display_name)
            .unwrap_or(INACCESSIBLE_DISPLAY_NAME)
    }
}
