//! Export and stream-out instructions.

use std::collections::HashMap;
use std::sync::OnceLock;

use latte_isa::{
    CfExpInst, Chan, ControlFlowInst, ExportType, MemExportType, Sel, EXPORT_POSITION_BASE,
};

use crate::descriptor::{Export, Feedback};
use crate::error::{Result, TranslateErrorKind};
use crate::swizzle::{condense, select_vector};
use crate::translate::{CfFn, State};

pub(crate) fn lookup(op: CfExpInst) -> Option<CfFn> {
    static TABLE: OnceLock<HashMap<CfExpInst, CfFn>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let mut table: HashMap<CfExpInst, CfFn> = HashMap::new();
            table.insert(CfExpInst::Exp, export);
            table.insert(CfExpInst::ExpDone, export);
            table.insert(CfExpInst::MemStream0, mem_stream);
            table.insert(CfExpInst::MemStream1, mem_stream);
            table.insert(CfExpInst::MemStream2, mem_stream);
            table.insert(CfExpInst::MemStream3, mem_stream);
            table
        })
        .get(&op)
        .copied()
}

const MAX_GPR: u32 = 127;

fn register(index: u32, rel: bool) -> String {
    if rel {
        format!("R[{index} + AL]")
    } else {
        format!("R[{index}]")
    }
}

fn export(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    let word0 = cf.exp_word0();
    let word1 = cf.exp_swiz_word1();

    let raw_type = word0.export_type();
    let ty = ExportType::from_raw(raw_type).ok_or(TranslateErrorKind::InvalidExportType(raw_type))?;

    let raw_sels = [0, 1, 2, 3].map(|i| word1.sel(i));
    if raw_sels.iter().all(|&raw| raw == Sel::Mask.raw()) {
        tracing::warn!(cf_pc = state.cf_pc, export = %ty, "skipping fully masked export");
        return Ok(());
    }
    let (mask, sels) = condense(&raw_sels)?;

    let burst_count = word1.burst_count();
    if word0.rw_gpr() + burst_count > MAX_GPR {
        return Err(TranslateErrorKind::ExportRegisterOutOfRange {
            gpr: word0.rw_gpr(),
            burst_count,
        });
    }

    for i in 0..=burst_count {
        let index = word0.array_base() + i;
        let id = match ty {
            ExportType::Position => index
                .checked_sub(EXPORT_POSITION_BASE)
                .ok_or(TranslateErrorKind::InvalidPositionIndex(index))?,
            ExportType::Parameter | ExportType::Pixel => index,
        };

        let export = Export { ty, id };
        if !state.exports.contains(&export) {
            state.exports.push(export);
        }

        let src = register(word0.rw_gpr() + i, word0.rw_rel());
        state.out.line(&format!(
            "{}.{mask} = {};",
            export.variable(),
            select_vector(&src, &sels)?
        ));
    }
    Ok(())
}

fn mem_stream(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    let stream = match cf.opcode() {
        Some(latte_isa::CfOpcode::Export(op)) => op.stream_index(),
        _ => None,
    }
    .ok_or_else(|| TranslateErrorKind::UnsupportedExport(format!("CF_INST_{}", cf.raw_opcode())))?;

    let word0 = cf.exp_word0();
    let word1 = cf.exp_buf_word1();

    let raw_type = word0.export_type();
    match MemExportType::from_raw(raw_type) {
        Some(MemExportType::Write) => {}
        Some(other) => {
            return Err(TranslateErrorKind::UnsupportedStreamExport {
                stream,
                ty: other.name().to_owned(),
            })
        }
        None => return Err(TranslateErrorKind::InvalidExportType(raw_type)),
    }

    let size = word1.array_size() + 1;
    if size > 4 {
        return Err(TranslateErrorKind::UnsupportedStreamSize { stream, size });
    }

    let comp_mask = word1.comp_mask();
    if comp_mask == 0 {
        return Err(TranslateErrorKind::EmptyStreamMask(stream));
    }
    let sels: Vec<Sel> = Chan::ALL
        .into_iter()
        .filter(|chan| comp_mask & (1 << chan.index()) != 0)
        .map(|chan| match chan {
            Chan::X => Sel::X,
            Chan::Y => Sel::Y,
            Chan::Z => Sel::Z,
            Chan::W => Sel::W,
        })
        .collect();

    let feedback = Feedback {
        stream_index: stream,
        offset: word0.array_base() * 4,
        size,
        components: comp_mask.count_ones(),
    };
    if let Some(feedbacks) = state.feedbacks.get_mut(stream as usize) {
        if !feedbacks.contains(&feedback) {
            feedbacks.push(feedback);
        }
    }

    let src = register(word0.rw_gpr(), word0.rw_rel());
    state.out.line(&format!(
        "{} = {};",
        feedback.variable(),
        select_vector(&src, &sels)?
    ));
    Ok(())
}
