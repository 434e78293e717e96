use std::num::NonZeroU32;

use crate::error::DrawError;
use crate::random::RandomSource;
use crate::types::Order;

/// A sampled ticket: the owning order, the position inside it, and the global
/// offset that was drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledTicket<'a> {
    pub order: &'a Order,
    pub position: u32,
    pub offset: u32,
}

/// Sum of `ticket_count` across `orders`.
pub fn total_sold(orders: &[Order]) -> Result<u32, DrawError> {
    let total: u64 = orders.iter().map(|o| u64::from(o.ticket_count)).sum();
    u32::try_from(total).map_err(|_| {
        DrawError::invariant(format!(
            "{} orders sum to {} tickets, beyond the u32 ticket space",
            orders.len(),
            total
        ))
    })
}

/// Map a global offset in `[0, total_sold)` to its owning order and the
/// position inside that order. Orders partition the offset space in list order.
pub fn locate_offset(orders: &[Order], offset: u32) -> Result<(&Order, u32), DrawError> {
    let target = u64::from(offset);
    let mut accumulated: u64 = 0;

    for order in orders {
        let count = u64::from(order.ticket_count);
        if accumulated + count > target {
            // target - accumulated < count <= u32::MAX
            return Ok((order, (target - accumulated) as u32));
        }
        accumulated += count;
    }

    Err(DrawError::invariant(format!(
        "no owning order for offset {} across {} orders totalling {} tickets",
        offset,
        orders.len(),
        accumulated
    )))
}

/// Pick one sold ticket uniformly at random.
///
/// Each ticket, not each order, is equally likely: the sample space is the
/// sum of `ticket_count`. `total_sold` must equal that sum and be positive.
pub fn pick_winner<'a, R>(
    orders: &'a [Order],
    total_sold: u32,
    rng: &mut R,
) -> Result<SampledTicket<'a>, DrawError>
where
    R: RandomSource + ?Sized,
{
    let bound = NonZeroU32::new(total_sold)
        .ok_or_else(|| DrawError::invariant("cannot sample from zero sold tickets"))?;

    let offset = rng.next_below(bound);
    let (order, position) = locate_offset(orders, offset)?;

    Ok(SampledTicket {
        order,
        position,
        offset,
    })
}
