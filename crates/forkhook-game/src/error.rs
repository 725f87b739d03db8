//! Rule and setup violations the turn engine can report.

/// Why the engine refused an intent.
///
/// Everything here is recoverable: a rejected intent never mutates state,
/// and the reason is reported to the acting player only. The one
/// exception is [`Internal`](PlayError::Internal), which flags an engine
/// inconsistency (a programming defect, not a rule violation) so it can
/// be distinguished from ordinary rejections instead of silently
/// corrupting hands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    #[error("the game has not started")]
    NotStarted,
    #[error("the game is already running")]
    AlreadyStarted,
    #[error("need at least two players to start")]
    NotEnoughPlayers,
    #[error("the table is full")]
    TableFull,
    #[error("you are not seated at this table")]
    NotSeated,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("you don't hold those cards")]
    UnknownCards,
    #[error("that is not a valid combination")]
    InvalidCombo,
    #[error("that does not beat the cards in play")]
    CannotBeat,
    #[error("only a fork or a hook is allowed right now")]
    InterruptOnly,
    #[error("a fork must be a pair of the exposed rank")]
    WrongForkRank,
    #[error("you cannot fork your own card")]
    SelfCannotFork,
    #[error("a hook must be one card of the exposed rank")]
    WrongHookRank,
    #[error("the forking player cannot hook")]
    ForkerCannotHook,
    #[error("the opening lead cannot be passed")]
    OpeningLeadCannotPass,
    #[error("player names cannot be empty")]
    EmptyName,
    #[error("internal error: {0}")]
    Internal(String),
}
