use crate::error::DrawError;
use crate::types::Order;

/// Map a zero-based position inside an order to the ticket index it owns.
///
/// Positions walk the ranges in stored order, then the lucky indices.
/// A position past the order's real position space means the order's declared
/// `ticket_count` disagrees with its ranges, which is reported as
/// [`DrawError::OutOfBounds`].
pub fn resolve_position(order: &Order, position: u32) -> Result<u32, DrawError> {
    let target = u64::from(position);
    let mut accumulated: u64 = 0;

    for range in &order.ticket_ranges {
        let range_size = range.size();
        if accumulated + range_size > target {
            let index = u64::from(range.start) + (target - accumulated);
            return u32::try_from(index).map_err(|_| {
                DrawError::invariant(format!(
                    "order {} resolves position {} past u32 ticket space",
                    order.id, position
                ))
            });
        }
        accumulated += range_size;
    }

    let lucky_position = target - accumulated;
    if let Some(&index) = usize::try_from(lucky_position)
        .ok()
        .and_then(|i| order.lucky_indices.get(i))
    {
        return Ok(index);
    }

    Err(DrawError::OutOfBounds {
        order_id: order.id,
        position,
        ticket_count: order.ticket_count,
        resolvable: order.position_space(),
    })
}
