//! # Reserved Address Scheme
//!
//! Two disjoint path namespaces the relay intercepts:
//!
//! ```text
//! ./@cancellation@/{requestId}/{clientId}   query / set / delete a record
//! ./@rpc@/{requestId}                       forward a call to the owning context
//! ```
//!
//! Paths are relative so a context mounted under a sub-path still produces an
//! address the relay recognizes; matching looks for the marker anywhere in the
//! path.
//!
//! The request id segment is percent-encoded, so string ids may contain `/`
//! or be empty. An empty id is written with a trailing `/`
//! (`./@cancellation@//{clientId}`, `./@cancellation@//`).

use crate::correlation::CorrelationId;
use crate::errors::AddressError;
use crate::ids::{CancellationId, ClientId};
use std::fmt;

/// Marker of the cancellation namespace.
pub const CANCELLATION_MARKER: &str = "/@cancellation@/";

/// Marker of the RPC forwarding namespace.
pub const RPC_MARKER: &str = "/@rpc@/";

/// A parsed reserved address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayAddress {
    /// Record for `id`, scoped to `client` (the requester when absent).
    Cancellation {
        id: CancellationId,
        client: Option<ClientId>,
    },
    /// Forwarded call, optionally tagged with its correlation id.
    Rpc { request_id: Option<CorrelationId> },
}

impl RelayAddress {
    /// Address of the record `(id, client)`.
    #[must_use]
    pub fn cancellation(id: &CancellationId, client: ClientId) -> Self {
        Self::Cancellation {
            id: id.clone(),
            client: Some(client),
        }
    }

    /// Address of a record scoped to whoever sends the request.
    #[must_use]
    pub fn own_cancellation(id: &CancellationId) -> Self {
        Self::Cancellation {
            id: id.clone(),
            client: None,
        }
    }

    /// Address for forwarding the call `request_id`.
    #[must_use]
    pub fn rpc(request_id: CorrelationId) -> Self {
        Self::Rpc {
            request_id: Some(request_id),
        }
    }

    /// Whether `path` falls in the cancellation namespace.
    #[must_use]
    pub fn is_cancellation_path(path: &str) -> bool {
        path.contains(CANCELLATION_MARKER)
    }

    /// Whether `path` falls in the RPC namespace.
    #[must_use]
    pub fn is_rpc_path(path: &str) -> bool {
        path.contains(RPC_MARKER)
    }

    /// Parse a path.
    ///
    /// Returns `Ok(None)` for paths outside both namespaces.
    pub fn parse(path: &str) -> Result<Option<Self>, AddressError> {
        if let Some(pos) = path.find(CANCELLATION_MARKER) {
            let rest = &path[pos + CANCELLATION_MARKER.len()..];
            if rest.is_empty() {
                return Err(AddressError::MissingRequestId {
                    path: path.to_string(),
                });
            }
            let (segment, client) = match rest.split_once('/') {
                Some((segment, client)) => (segment, client.trim_end_matches('/')),
                None => (rest, ""),
            };
            let id = urlencoding::decode(segment).map_err(|_| AddressError::InvalidRequestId {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
            let client = if client.is_empty() {
                None
            } else {
                Some(
                    ClientId::parse(client).map_err(|_| AddressError::InvalidClientId {
                        path: path.to_string(),
                        segment: client.to_string(),
                    })?,
                )
            };
            return Ok(Some(Self::Cancellation {
                id: CancellationId::from_segment(&id),
                client,
            }));
        }

        if let Some(pos) = path.find(RPC_MARKER) {
            let rest = path[pos + RPC_MARKER.len()..].trim_end_matches('/');
            let request_id = if rest.is_empty() {
                None
            } else {
                Some(
                    CorrelationId::parse(rest).map_err(|_| AddressError::InvalidRequestId {
                        path: path.to_string(),
                        segment: rest.to_string(),
                    })?,
                )
            };
            return Ok(Some(Self::Rpc { request_id }));
        }

        Ok(None)
    }

    /// Render as a relative path.
    #[must_use]
    pub fn to_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RelayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancellation {
                id,
                client: Some(client),
            } => write!(f, ".{CANCELLATION_MARKER}{}/{client}", encode_id(id)),
            Self::Cancellation { id, client: None } => {
                let segment = encode_id(id);
                if segment.is_empty() {
                    write!(f, ".{CANCELLATION_MARKER}/")
                } else {
                    write!(f, ".{CANCELLATION_MARKER}{segment}")
                }
            }
            Self::Rpc {
                request_id: Some(request_id),
            } => write!(f, ".{RPC_MARKER}{request_id}"),
            Self::Rpc { request_id: None } => write!(f, ".{RPC_MARKER}"),
        }
    }
}

fn encode_id(id: &CancellationId) -> String {
    urlencoding::encode(&id.record_key()).into_owned()
}
