//! pest grammar front end producing [`Statement`]s.

use latte_isa::{AluUnit, Chan, IndexMode, MemExportType, OutputModifier, Sel};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::{
    AluClauseItem, AluClauseStatement, AluDst, AluGroupStatement, AluInstStatement, AluSrc,
    AluSrcValue, CfStatement, Comment, ExportSource, ExportStatement, ExportTarget, FetchRegister,
    Property, Statement, TexClauseItem, TexClauseStatement, TexFetchStatement, VtxDst,
    VtxFetchStatement,
};
use crate::error::{AssemblyError, SourceLocation};

#[derive(Parser)]
#[grammar = "latte.pest"]
struct LatteParser;

type Result<T> = std::result::Result<T, AssemblyError>;

/// Parses a whole program into its top-level statements.
pub fn parse(source: &str) -> Result<Vec<Statement>> {
    let mut pairs = LatteParser::parse(Rule::program, source).map_err(grammar_error)?;
    let Some(program) = pairs.next() else {
        return Ok(Vec::new());
    };

    let mut statements = Vec::new();
    for pair in program.into_inner() {
        let statement = match pair.as_rule() {
            Rule::end_of_program => Statement::EndOfProgram(location(&pair)),
            Rule::comment => Statement::Comment(comment(pair)),
            Rule::alu_clause => Statement::AluClause(alu_clause(pair)?),
            Rule::tex_clause => Statement::TexClause(tex_clause(pair)?),
            Rule::cf_exp_inst => Statement::Export(cf_exp_inst(pair)?),
            Rule::cf_inst => Statement::Cf(cf_inst(pair)?),
            Rule::EOI => continue,
            _ => return Err(unexpected(&pair)),
        };
        statements.push(statement);
    }

    Ok(statements)
}

fn grammar_error(err: pest::error::Error<Rule>) -> AssemblyError {
    use pest::error::LineColLocation;

    let (line, column) = match err.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    AssemblyError::Parse {
        location: SourceLocation::new(line, column),
        message: err.variant.message().into_owned(),
    }
}

fn location(pair: &Pair<Rule>) -> SourceLocation {
    let (line, column) = pair.as_span().start_pos().line_col();
    SourceLocation::new(line, column)
}

fn parse_error(pair: &Pair<Rule>, message: impl Into<String>) -> AssemblyError {
    AssemblyError::Parse {
        location: location(pair),
        message: message.into(),
    }
}

fn unexpected(pair: &Pair<Rule>) -> AssemblyError {
    parse_error(pair, format!("unexpected {:?} {:?}", pair.as_rule(), pair.as_str()))
}

fn number(pair: &Pair<Rule>) -> Result<u32> {
    pair.as_str()
        .parse()
        .map_err(|_| parse_error(pair, format!("number {} does not fit in 32 bits", pair.as_str())))
}

/// The first `number` nested anywhere below `pair`.
fn inner_number(pair: Pair<Rule>) -> Result<u32> {
    match pair.clone().into_inner().flatten().find(|p| p.as_rule() == Rule::number) {
        Some(n) => number(&n),
        None => Err(unexpected(&pair)),
    }
}

fn chan(pair: &Pair<Rule>) -> Result<Chan> {
    pair.as_str()
        .chars()
        .next()
        .and_then(Chan::from_char)
        .ok_or_else(|| unexpected(pair))
}

fn swizzle(pair: &Pair<Rule>) -> Result<[Sel; 4]> {
    let mut sels = [Sel::Mask; 4];
    for (sel, c) in sels.iter_mut().zip(pair.as_str().chars()) {
        *sel = Sel::from_char(c).ok_or_else(|| unexpected(pair))?;
    }
    Ok(sels)
}

fn rel(pair: Pair<Rule>) -> Result<IndexMode> {
    let text = pair.as_str().trim_start_matches('[').trim_end_matches(']');
    IndexMode::from_name(text).ok_or_else(|| unexpected(&pair))
}

fn comment(pair: Pair<Rule>) -> Comment {
    let location = location(&pair);
    let text = pair
        .into_inner()
        .next()
        .map(|text| text.as_str().to_owned())
        .unwrap_or_default();
    Comment { text, location }
}

fn property(pair: Pair<Rule>) -> Property {
    let location = location(&pair);
    let mut name = String::new();
    let mut value = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::prop_name => name = inner.as_str().to_owned(),
            _ => value = Some(inner.as_str().trim().to_owned()),
        }
    }
    Property {
        name,
        value,
        location,
    }
}

/// Register reference components shared by sources, destinations and fetch operands.
#[derive(Default)]
struct RegisterParts {
    index: u32,
    rel: Option<IndexMode>,
    chan: Option<Chan>,
    swizzle: Option<[Sel; 4]>,
}

fn register_parts(pair: Pair<Rule>) -> Result<RegisterParts> {
    let mut parts = RegisterParts::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::gpr => parts.index = inner_number(inner)?,
            Rule::number => parts.index = number(&inner)?,
            Rule::rel => parts.rel = Some(rel(inner)?),
            Rule::chan => parts.chan = Some(chan(&inner)?),
            Rule::swizzle => parts.swizzle = Some(swizzle(&inner)?),
            Rule::kcache_bank => {}
            _ => return Err(unexpected(&inner)),
        }
    }
    Ok(parts)
}

fn previous_group(pair: &Pair<Rule>) -> Result<Option<u32>> {
    pair.clone()
        .into_inner()
        .find(|inner| inner.as_rule() == Rule::number)
        .map(|inner| number(&inner))
        .transpose()
}

fn cf_inst(pair: Pair<Rule>) -> Result<CfStatement> {
    let location = location(&pair);
    let mut index = 0;
    let mut opcode = String::new();
    let mut properties = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::inst_count => index = number(&inner)?,
            Rule::cf_opcode => opcode = inner.as_str().to_owned(),
            Rule::property => properties.push(property(inner)),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(CfStatement {
        index,
        opcode,
        properties,
        location,
    })
}

fn cf_exp_inst(pair: Pair<Rule>) -> Result<ExportStatement> {
    let location = location(&pair);
    let mut index = 0;
    let mut opcode = String::new();
    let mut target = ExportTarget::Pixel(0);
    let mut src = ExportSource {
        gpr: 0,
        rel: None,
        swizzle: None,
    };
    let mut properties = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::inst_count => index = number(&inner)?,
            Rule::exp_opcode => opcode = inner.as_str().to_owned(),
            Rule::exp_position => target = ExportTarget::Position(inner_number(inner)?),
            Rule::exp_param => target = ExportTarget::Parameter(inner_number(inner)?),
            Rule::exp_pixel => target = ExportTarget::Pixel(inner_number(inner)?),
            Rule::exp_write => {
                let mut kind = MemExportType::Write;
                let mut base = 0;
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::exp_write_kind => {
                            kind = MemExportType::from_name(part.as_str())
                                .ok_or_else(|| unexpected(&part))?;
                        }
                        Rule::number => base = number(&part)?,
                        _ => return Err(unexpected(&part)),
                    }
                }
                target = ExportTarget::Memory { kind, base };
            }
            Rule::exp_src => {
                let parts = register_parts(inner)?;
                src = ExportSource {
                    gpr: parts.index,
                    rel: parts.rel,
                    swizzle: parts.swizzle,
                };
            }
            Rule::property => properties.push(property(inner)),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(ExportStatement {
        index,
        opcode,
        target,
        src,
        properties,
        location,
    })
}

fn alu_clause(pair: Pair<Rule>) -> Result<AluClauseStatement> {
    let location = location(&pair);
    let mut index = 0;
    let mut opcode = String::new();
    let mut properties = Vec::new();
    let mut items = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::inst_count => index = number(&inner)?,
            Rule::alu_clause_opcode => opcode = inner.as_str().to_owned(),
            Rule::property => properties.push(property(inner)),
            Rule::alu_group => items.push(AluClauseItem::Group(alu_group(inner)?)),
            Rule::comment => items.push(AluClauseItem::Comment(comment(inner))),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(AluClauseStatement {
        index,
        opcode,
        properties,
        items,
        location,
    })
}

fn alu_group(pair: Pair<Rule>) -> Result<AluGroupStatement> {
    let location = location(&pair);
    let mut index = 0;
    let mut insts = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::inst_count => index = number(&inner)?,
            Rule::alu_inst => insts.push(alu_inst(inner)?),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(AluGroupStatement {
        index,
        insts,
        location,
    })
}

fn alu_inst(pair: Pair<Rule>) -> Result<AluInstStatement> {
    let location = location(&pair);
    let mut unit = AluUnit::X;
    let mut opcode = String::new();
    let mut omod = OutputModifier::Off;
    let mut dst = None;
    let mut srcs = Vec::new();
    let mut properties = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::alu_unit => {
                unit = inner
                    .as_str()
                    .chars()
                    .next()
                    .and_then(AluUnit::from_char)
                    .ok_or_else(|| unexpected(&inner))?;
            }
            Rule::alu_opcode => {
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::mnemonic => opcode = part.as_str().to_owned(),
                        Rule::alu_omod => {
                            omod = OutputModifier::from_name(part.as_str())
                                .ok_or_else(|| unexpected(&part))?;
                        }
                        _ => return Err(unexpected(&part)),
                    }
                }
            }
            Rule::alu_dst => dst = Some(alu_dst(inner)?),
            Rule::alu_src => srcs.push(alu_src(inner)?),
            Rule::property => properties.push(property(inner)),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(AluInstStatement {
        unit,
        opcode,
        omod,
        dst,
        srcs,
        properties,
        location,
    })
}

fn alu_dst(pair: Pair<Rule>) -> Result<AluDst> {
    if pair
        .clone()
        .into_inner()
        .any(|inner| inner.as_rule() == Rule::write_mask_off)
    {
        return Ok(AluDst::Masked);
    }

    let parts = register_parts(pair)?;
    Ok(AluDst::Gpr {
        gpr: parts.index,
        rel: parts.rel,
        chan: parts.chan,
    })
}

fn alu_src(pair: Pair<Rule>) -> Result<AluSrc> {
    let location = location(&pair);
    let mut neg = false;
    let mut abs = false;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::neg => neg = true,
            Rule::int_literal => {
                let parsed = inner
                    .as_str()
                    .parse::<i64>()
                    .map_err(|_| parse_error(&inner, "integer immediate does not fit in 64 bits"))?;
                value = Some(AluSrcValue::IntImmediate(parsed));
            }
            Rule::abs_src => {
                abs = true;
                let Some(operand) = inner.clone().into_inner().next() else {
                    return Err(unexpected(&inner));
                };
                value = Some(alu_src_value(operand)?);
            }
            _ => value = Some(alu_src_value(inner)?),
        }
    }

    match value {
        Some(value) => Ok(AluSrc {
            value,
            neg,
            abs,
            location,
        }),
        None => Err(AssemblyError::Parse {
            location,
            message: "missing source operand".to_owned(),
        }),
    }
}

fn alu_src_value(pair: Pair<Rule>) -> Result<AluSrcValue> {
    match pair.as_rule() {
        Rule::gpr_src => {
            let parts = register_parts(pair)?;
            Ok(AluSrcValue::Gpr {
                gpr: parts.index,
                rel: parts.rel,
                chan: parts.chan,
            })
        }
        Rule::kcache_src => {
            let bank = u32::from(pair.as_str().starts_with("KC1"));
            let parts = register_parts(pair)?;
            Ok(AluSrcValue::Kcache {
                bank,
                index: parts.index,
                rel: parts.rel,
                chan: parts.chan,
            })
        }
        Rule::cfile_src => {
            let parts = register_parts(pair)?;
            Ok(AluSrcValue::ConstFile {
                index: parts.index,
                rel: parts.rel,
                chan: parts.chan,
            })
        }
        Rule::pv_src => {
            let group = previous_group(&pair)?;
            let parts = register_parts(pair)?;
            Ok(AluSrcValue::PreviousVector {
                group,
                chan: parts.chan,
            })
        }
        Rule::ps_src => Ok(AluSrcValue::PreviousScalar {
            group: previous_group(&pair)?,
        }),
        Rule::hex_literal => Ok(AluSrcValue::Literal {
            hex: Some(hex_value(&pair)?),
            float: None,
        }),
        Rule::hex_float_literal => {
            let mut hex = None;
            let mut float = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::hex_value => hex = Some(hex_value(&inner)?),
                    Rule::float_value => float = Some(float_value(&inner)?),
                    _ => return Err(unexpected(&inner)),
                }
            }
            Ok(AluSrcValue::Literal { hex, float })
        }
        Rule::float_literal => Ok(AluSrcValue::Literal {
            hex: None,
            float: Some(float_value(&pair)?),
        }),
        _ => Err(unexpected(&pair)),
    }
}

fn hex_value(pair: &Pair<Rule>) -> Result<u32> {
    let text = pair.as_str();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u32::from_str_radix(digits, 16)
        .map_err(|_| parse_error(pair, format!("hex literal {text} does not fit in 32 bits")))
}

fn float_value(pair: &Pair<Rule>) -> Result<f32> {
    let text = pair.as_str();
    text.trim_end_matches('f')
        .parse::<f32>()
        .map_err(|_| parse_error(pair, format!("invalid float literal {text}")))
}

fn tex_clause(pair: Pair<Rule>) -> Result<TexClauseStatement> {
    let location = location(&pair);
    let mut index = 0;
    let mut opcode = String::new();
    let mut properties = Vec::new();
    let mut items = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::inst_count => index = number(&inner)?,
            Rule::tex_clause_opcode => opcode = inner.as_str().to_owned(),
            Rule::property => properties.push(property(inner)),
            Rule::tex_fetch_inst => items.push(TexClauseItem::Tex(tex_fetch_inst(inner)?)),
            Rule::vtx_fetch_inst => items.push(TexClauseItem::Vtx(vtx_fetch_inst(inner)?)),
            Rule::comment => items.push(TexClauseItem::Comment(comment(inner))),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(TexClauseStatement {
        index,
        opcode,
        properties,
        items,
        location,
    })
}

fn fetch_register(pair: Pair<Rule>) -> Result<FetchRegister> {
    let parts = register_parts(pair)?;
    Ok(FetchRegister {
        gpr: parts.index,
        rel: parts.rel,
        swizzle: parts.swizzle,
    })
}

fn tex_fetch_inst(pair: Pair<Rule>) -> Result<TexFetchStatement> {
    let location = location(&pair);
    let mut index = 0;
    let mut opcode = String::new();
    let mut dst = None;
    let mut src = FetchRegister {
        gpr: 0,
        rel: None,
        swizzle: None,
    };
    let mut resource_id = 0;
    let mut sampler_id = 0;
    let mut properties = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::inst_count => index = number(&inner)?,
            Rule::tex_opcode => opcode = inner.as_str().to_owned(),
            Rule::tex_dst => {
                dst = match inner.into_inner().next() {
                    Some(reg) if reg.as_rule() == Rule::fetch_reg => Some(fetch_register(reg)?),
                    _ => None,
                };
            }
            Rule::fetch_reg => src = fetch_register(inner)?,
            Rule::resource_id => resource_id = inner_number(inner)?,
            Rule::sampler_id => sampler_id = inner_number(inner)?,
            Rule::property => properties.push(property(inner)),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(TexFetchStatement {
        index,
        opcode,
        dst,
        src,
        resource_id,
        sampler_id,
        properties,
        location,
    })
}

fn vtx_fetch_inst(pair: Pair<Rule>) -> Result<VtxFetchStatement> {
    let location = location(&pair);
    let mut index = 0;
    let mut opcode = String::new();
    let mut dst = VtxDst::Semantic {
        id: 0,
        swizzle: None,
    };
    let mut src = RegisterParts::default();
    let mut buffer_id = 0;
    let mut properties = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::inst_count => index = number(&inner)?,
            Rule::vtx_opcode => opcode = inner.as_str().to_owned(),
            Rule::vtx_dst => {
                let Some(target) = inner.clone().into_inner().next() else {
                    return Err(unexpected(&inner));
                };
                dst = match target.as_rule() {
                    Rule::semantic_dst => {
                        let parts = register_parts(target)?;
                        VtxDst::Semantic {
                            id: parts.index,
                            swizzle: parts.swizzle,
                        }
                    }
                    _ => VtxDst::Gpr(fetch_register(target)?),
                };
            }
            Rule::vtx_src => src = register_parts(inner)?,
            Rule::buffer_id => buffer_id = inner_number(inner)?,
            Rule::property => properties.push(property(inner)),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(VtxFetchStatement {
        index,
        opcode,
        dst,
        src_gpr: src.index,
        src_rel: src.rel,
        src_chan: src.chan,
        buffer_id,
        properties,
        location,
    })
}
