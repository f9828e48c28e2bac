/// Off-peak/peak energy split per session.
pub mod allocator;
/// Distance and emissions estimate.
pub mod impact;
pub mod invoice;
pub mod types;

pub use allocator::{Allocation, SessionAllocator};
pub use impact::{ImpactEstimate, ImpactModel};
pub use invoice::{Invoice, InvoiceLine, PeriodTotals};
pub use types::{ChargingSession, CostBreakdown};
