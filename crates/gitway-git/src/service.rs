//! Transfer service kinds.
//!
//! The smart protocol exposes exactly two services. Their wire names show
//! up in three places the gateway has to keep consistent: the `?service=`
//! query parameter, the advertisement content type, and the RPC result
//! content type.

/// Which negotiation role the backend plays for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Serves fetch/clone (`git-upload-pack`).
    UploadPack,
    /// Serves push (`git-receive-pack`).
    ReceivePack,
}

impl ServiceKind {
    /// The backend subcommand for this service.
    pub fn role(&self) -> &'static str {
        match self {
            Self::UploadPack => "upload-pack",
            Self::ReceivePack => "receive-pack",
        }
    }

    /// The wire name clients use (`git-` prefixed).
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::UploadPack => "git-upload-pack",
            Self::ReceivePack => "git-receive-pack",
        }
    }

    /// Parses the `?service=` query parameter value.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "git-upload-pack" => Some(Self::UploadPack),
            "git-receive-pack" => Some(Self::ReceivePack),
            _ => None,
        }
    }

    /// Content type of the smart ref advertisement response.
    pub fn advertisement_content_type(&self) -> String {
        format!("application/x-{}-advertisement", self.wire_name())
    }

    /// Content type of the stateless-RPC result response.
    pub fn result_content_type(&self) -> String {
        format!("application/x-git-{}-result", self.role())
    }
}
