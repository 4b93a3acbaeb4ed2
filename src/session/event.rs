/// Events emitted by session operations.
/// The presentation layer consumes these for sound effects.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    LetterPlaced,
    LetterRemoved,
    GuessIncorrect,
    LevelSolved,
    HintUsed,
    CoinsExchanged,
    CoinsPurchased,
    GameCompleted,
    ActionDenied,
    SaveFailed,
}
