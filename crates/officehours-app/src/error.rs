use officehours_core::conflict::ConflictResult;
use officehours_core::error::DomainError;
use officehours_ports::error::PortError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("port error: {0}")]
    Port(#[from] PortError),
    #[error(
        "office hour overlaps {} existing office hour(s) of the same host",
        .0.conflicting_rule_ids.len()
    )]
    HostConflict(ConflictResult),
}
