//! Component selection shared by fetch and export translation.

use latte_isa::{Chan, Sel};

use crate::error::{Result, TranslateErrorKind};

/// Drops masked components, returning the written destination mask (e.g. `"xz"`) and the
/// selectors feeding each written component.
pub(crate) fn condense(raw_sels: &[u32]) -> Result<(String, Vec<Sel>)> {
    let mut mask = String::new();
    let mut sels = Vec::new();
    for (&raw, chan) in raw_sels.iter().zip(Chan::ALL) {
        let sel = Sel::from_raw(raw).ok_or(TranslateErrorKind::InvalidSelect(raw))?;
        if sel != Sel::Mask {
            mask.push(chan.as_char());
            sels.push(sel);
        }
    }
    Ok((mask, sels))
}

pub(crate) fn select_value(src: &str, sel: Sel) -> Result<String> {
    match sel {
        Sel::X | Sel::Y | Sel::Z | Sel::W => Ok(format!("{src}.{}", sel.as_char())),
        Sel::Zero => Ok("0".to_owned()),
        Sel::One => Ok("1".to_owned()),
        Sel::Mask => Err(TranslateErrorKind::InvalidSelect(sel.raw())),
    }
}

/// Builds a value of `sels.len()` components, using a plain swizzle when possible.
pub(crate) fn select_vector(src: &str, sels: &[Sel]) -> Result<String> {
    match sels {
        [] => Err(TranslateErrorKind::InvalidSelect(Sel::Mask.raw())),
        [sel] => select_value(src, *sel),
        _ if sels.iter().all(|sel| matches!(sel, Sel::X | Sel::Y | Sel::Z | Sel::W)) => {
            let swizzle: String = sels.iter().map(|sel| sel.as_char()).collect();
            Ok(format!("{src}.{swizzle}"))
        }
        _ => {
            let values = sels
                .iter()
                .map(|sel| select_value(src, *sel))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("vec{}({})", sels.len(), values.join(", ")))
        }
    }
}
