//! CLI commands

use iu_state::Transient;

use crate::context::AppContext;

/// Render a payload as pretty JSON when it is JSON, raw text otherwise
pub fn render_payload(payload: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        Err(_) => String::from_utf8_lossy(payload).into_owned(),
    }
}

/// Submit an invocation and print the committed result
pub async fn invoke(
    ctx: &AppContext,
    identity: &str,
    function: &str,
    args: &[String],
    transient: Transient,
) -> Result<(), anyhow::Error> {
    let invocation = ctx.submit(identity, function, args, transient).await?;

    println!(
        "✅ {} committed (block {}, tx {})",
        function, invocation.receipt.block_number, invocation.receipt.tx_id
    );
    if let Some(ref event) = invocation.receipt.event {
        println!("   Event: {}", event);
    }
    println!("{}", render_payload(&invocation.payload));
    Ok(())
}

/// Evaluate an entry point and print the result
pub async fn query(
    ctx: &AppContext,
    identity: &str,
    function: &str,
    args: &[String],
    transient: Transient,
) -> Result<(), anyhow::Error> {
    let payload = ctx.evaluate(identity, function, args, transient).await?;
    println!("{}", render_payload(&payload));
    Ok(())
}

/// List committed events
pub fn events(ctx: &AppContext, name: Option<&str>) -> Result<(), anyhow::Error> {
    let events = ctx.ledger().events()?;
    let mut shown = 0;

    for event in events.iter().filter(|e| name.map_or(true, |n| e.name == n)) {
        println!("{} {} {}", event.tx_id, event.name, render_payload(&event.payload));
        shown += 1;
    }

    println!("{} events", shown);
    Ok(())
}

/// Print ledger height and key count
pub fn status(ctx: &AppContext) -> Result<(), anyhow::Error> {
    println!("Height:     {}", ctx.ledger().height()?);
    println!("Keys:       {}", ctx.ledger().keys()?.len());
    println!("Admin MSP:  {}", ctx.config().admin_msp);
    println!("Journaled:  {}", ctx.ledger().is_journaled());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_payload() {
        assert_eq!(render_payload(b"true"), "true");
        assert_eq!(render_payload(b"{\"a\":1}"), "{\n  \"a\": 1\n}");
        assert_eq!(render_payload(b"plain bytes"), "plain bytes");
    }
}
