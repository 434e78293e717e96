use crate::error::DrawError;
use crate::types::NumberingConfig;

fn number_for(index: u32, config: &NumberingConfig) -> Option<u64> {
    u64::from(index)
        .checked_mul(config.step)
        .and_then(|offset| offset.checked_add(config.start_number))
}

/// Render a ticket index as the number shown to buyers.
///
/// `number = start_number + index * step`, zero padded to the width of the
/// last number in the raffle when `zero_pad` is set.
pub fn format_ticket_number(
    index: u32,
    config: &NumberingConfig,
    total_tickets: u32,
) -> Result<String, DrawError> {
    if index >= total_tickets {
        return Err(DrawError::Format {
            index,
            reason: format!("index outside raffle of {} tickets", total_tickets),
        });
    }

    let number = number_for(index, config).ok_or_else(|| DrawError::Format {
        index,
        reason: "ticket number overflows u64".to_string(),
    })?;

    let digits = if config.zero_pad {
        let highest = number_for(total_tickets - 1, config).ok_or_else(|| DrawError::Format {
            index,
            reason: "highest ticket number overflows u64".to_string(),
        })?;
        format!("{:0width$}", number, width = highest.to_string().len())
    } else {
        number.to_string()
    };

    Ok(format!(
        "{}{}{}",
        config.prefix.as_deref().unwrap_or_default(),
        digits,
        config.suffix.as_deref().unwrap_or_default()
    ))
}
