use crate::monitor::State;
use crate::source::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown collector `{0}`")]
    UnknownCollector(String),
    #[error("failed to set up collector `{name}`: {source}")]
    CollectorSetup {
        name: &'static str,
        #[source]
        source: SourceError,
    },
    #[error("cannot {operation} monitor in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: State,
    },
    #[error("failed to spawn sampling thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("sampling thread panicked")]
    LoopPanicked,
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }
}
