//! Subcommand implementations over a [`MemoryContext`]. Output goes to the given writer.

use std::io::Write;

use anyhow::Result;
use context_core::{DataBlob, KeyKind, MemoryContext, StateValue};
use serde_json::Value;

pub async fn show(ctx: &MemoryContext, out: &mut impl Write) -> Result<()> {
    let data = ctx.get_data().await?;
    let state = ctx.get_state().await?;
    writeln!(out, "state: {}", describe_state(state.as_ref()))?;
    writeln!(out, "data: {}", serde_json::to_string_pretty(&Value::Object(data))?)?;
    Ok(())
}

pub fn keys(ctx: &MemoryContext, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", ctx.storage_key(KeyKind::Data))?;
    writeln!(out, "{}", ctx.storage_key(KeyKind::State))?;
    Ok(())
}

pub async fn set_state(
    ctx: &MemoryContext,
    name: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    let state = ctx.set_state(name.map(StateValue::Raw)).await?;
    writeln!(out, "state: {}", describe_state(state.as_ref()))?;
    Ok(())
}

pub async fn update(
    ctx: &MemoryContext,
    values: Vec<(String, Value)>,
    out: &mut impl Write,
) -> Result<DataBlob> {
    let merged = ctx.update_data(values).await?;
    writeln!(
        out,
        "data: {}",
        serde_json::to_string_pretty(&Value::Object(merged.clone()))?
    )?;
    Ok(merged)
}

pub async fn clear(ctx: &MemoryContext, out: &mut impl Write) -> Result<()> {
    ctx.clear().await?;
    writeln!(out, "cleared")?;
    Ok(())
}

fn describe_state(state: Option<&StateValue>) -> String {
    match state {
        None => "-".to_string(),
        Some(StateValue::State(s)) if s.is_declared() => s.name().to_string(),
        Some(s) => format!("{} (detached)", s.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_show_empty_context() {
        let ctx = MemoryContext::new(Some(1), Some(2));
        let mut buf = Vec::new();
        show(&ctx, &mut buf).await.unwrap();
        assert_eq!(output(buf), "state: -\ndata: {}\n");
    }

    #[tokio::test]
    async fn test_update_then_show() {
        let ctx = MemoryContext::new(Some(1), Some(2));
        let merged = update(&ctx, vec![("a".to_string(), json!(1))], &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(merged["a"], json!(1));

        set_state(&ctx, Some("menu".to_string()), &mut Vec::new())
            .await
            .unwrap();

        let mut buf = Vec::new();
        show(&ctx, &mut buf).await.unwrap();
        let text = output(buf);
        assert!(text.starts_with("state: menu (detached)\n"));
        assert!(text.contains("\"a\": 1"));
    }

    #[tokio::test]
    async fn test_clear_and_set_state_none() {
        let ctx = MemoryContext::new(None, Some(2));
        set_state(&ctx, Some("x".to_string()), &mut Vec::new())
            .await
            .unwrap();

        let mut buf = Vec::new();
        set_state(&ctx, None, &mut buf).await.unwrap();
        assert_eq!(output(buf), "state: -\n");

        let mut buf = Vec::new();
        clear(&ctx, &mut buf).await.unwrap();
        assert_eq!(output(buf), "cleared\n");
        assert!(ctx.get_data().await.unwrap().is_empty());
    }

    #[test]
    fn test_keys() {
        let ctx = MemoryContext::new(None, Some(2));
        let mut buf = Vec::new();
        keys(&ctx, &mut buf).unwrap();
        assert_eq!(
            output(buf),
            "maxapi:context:data:none:2\nmaxapi:context:state:none:2\n"
        );
    }
}
