pub mod draw;
pub mod error;
pub mod format;
pub mod random;
pub mod resolver;
pub mod sampler;
pub mod sweep;
pub mod types;

pub use draw::{
    draw, DrawNotifier, DrawReceipt, DrawRequest, DrawResult, OrderSource, RaffleLedger,
    TicketFormatter,
};
pub use error::{DrawError, ErrorCategory};
pub use format::format_ticket_number;
pub use random::{BeaconRng, FixedSequence, RandomSource};
pub use resolver::resolve_position;
pub use sampler::{locate_offset, pick_winner, total_sold, SampledTicket};
pub use sweep::{sweep, RaffleDirectory, SweepOutcome, SweepReport};
pub use types::{
    BuyerSnapshot, DrawAudit, DrawMethod, DrawTrigger, NumberingConfig, Order, Raffle,
    RaffleStatus, TicketRange, WinnerRecord,
};
