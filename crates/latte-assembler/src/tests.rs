use indoc::indoc;
use latte_isa::{
    alu_src, disassemble, AluInst, AluOp2, Chan, DataFormat, ExportType, FetchInst, KcacheMode,
    TexWord1, EXPORT_POSITION_BASE,
};
use pretty_assertions::assert_eq;

use crate::comments::{parse_pixel_shader_comments, parse_vertex_shader_comments, CommentError};
use crate::gfd::{
    self, GfdFile, PixelShaderHeader, ShaderMode, ShaderVarType, VertexShader,
    VertexShaderHeader, PIXEL_SHADER_HEADER_SIZE, VERTEX_SHADER_HEADER_SIZE,
};
use crate::{compile, AssemblyError, CompiledProgram, SemanticError};

fn assemble(source: &str) -> CompiledProgram {
    match compile(source) {
        Ok(program) => program,
        Err(err) => panic!("assembly failed: {err}"),
    }
}

fn semantic_error(source: &str) -> SemanticError {
    match compile(source) {
        Err(AssemblyError::Semantic { kind, .. }) => kind,
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

fn alu_inst(program: &CompiledProgram, slot: usize) -> AluInst {
    AluInst::new(
        program.alu_clause_data[slot * 2],
        program.alu_clause_data[slot * 2 + 1],
    )
}

#[test]
fn assembles_alu_clause_and_export() {
    let program = assemble(indoc! {"
        00 ALU: ADDR(32) CNT(1)
              0   x: MOV            R0.x, R1.x
        01 EXP_DONE: POS0, R0.xyzw
        END_OF_PROGRAM
    "});

    assert_eq!(program.cf_insts.len(), 2);
    assert_eq!(program.alu_clause_base_address, 32);
    assert_eq!(program.alu_clause_data.len(), 2);

    let alu = program.cf_insts[0];
    assert_eq!(alu.alu_word0().addr(), 32);
    assert_eq!(alu.alu_word1().count(), 0);
    assert!(alu.alu_word1().barrier());
    assert!(!alu.end_of_program());

    let exp = program.cf_insts[1];
    assert_eq!(exp.exp_word0().export_type(), ExportType::Position.raw());
    assert_eq!(exp.exp_word0().array_base(), EXPORT_POSITION_BASE);
    assert!(exp.end_of_program());
    assert_eq!(program.exports.max_position, Some(0));

    let mov = alu_inst(&program, 0);
    assert_eq!(mov.opcode_name(), "MOV");
    assert!(mov.last());
    assert!(mov.write_mask());
    assert_eq!(mov.src(0).sel, 1);
    assert_eq!(mov.src(0).chan, Chan::X);
}

#[test]
fn binary_places_alu_clauses_on_256_byte_boundary() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
        01 EXP_DONE: POS0, R0
    "});

    let words = program.to_words();
    assert_eq!(words.len(), 32 * 2 + 2);
    assert!(words[4..64].iter().all(|word| *word == 0));
    assert_eq!(&words[64..], program.alu_clause_data.as_slice());
    assert_eq!(program.to_binary().len(), words.len() * 4);
}

#[test]
fn inline_constants_avoid_literal_slots() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: MOV R0.x, 1.0f
                  y: MOV R0.y, 0.5
                  z: MOV R0.z, 0.0f
                  w: MOV R0.w, -1
    "});

    assert_eq!(program.alu_clause_data.len(), 8);
    let sels: Vec<u32> = (0..4).map(|slot| alu_inst(&program, slot).src(0).sel).collect();
    assert_eq!(
        sels,
        vec![alu_src::IMM_1, alu_src::IMM_0_5, alu_src::IMM_0, alu_src::IMM_M1_INT]
    );
}

#[test]
fn literals_follow_their_group_padded_to_a_slot() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: MOV R1.x, 2.0f
                  y: MOV R1.y, (0x40400000, 3.0f)
                  z: MOV R1.z, 7
              1   x: MOV R2.x, 0x12345678
    "});

    let data = &program.alu_clause_data;
    // Group 0: three instructions, three literals and one padding word.
    assert_eq!(data.len(), 6 + 4 + 2 + 2);
    assert_eq!(&data[6..10], &[2.0f32.to_bits(), 0x4040_0000, 7, 0]);
    assert_eq!(alu_inst(&program, 1).src(0).sel, alu_src::LITERAL);
    assert_eq!(alu_inst(&program, 1).src(0).chan, Chan::Y);
    assert_eq!(alu_inst(&program, 2).src(0).chan, Chan::Z);

    let second = AluInst::new(data[10], data[11]);
    assert_eq!(second.src(0).sel, alu_src::LITERAL);
    assert_eq!(second.src(0).chan, Chan::X);
    assert_eq!(&data[12..14], &[0x1234_5678, 0]);

    // Slots: 3 instructions + 2 literal slots + 1 instruction + 1 literal slot.
    assert_eq!(program.cf_insts[0].alu_word1().count(), 6);
}

#[test]
fn zero_with_nonzero_hex_stays_a_literal() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: MOV R0.x, (0x80000000, -0.0)
    "});
    let mov = alu_inst(&program, 0);
    assert_eq!(mov.src(0).sel, alu_src::LITERAL);
    assert_eq!(program.alu_clause_data[2], 0x8000_0000);
}

#[test]
fn only_the_final_instruction_of_a_group_is_last() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: ADD R0.x, R1.x, R2.x
                  y: MUL R0.y, R1.y, KC0[3].y
                  t: RECIP_IEEE R3.x, R1.w
    "});

    let lasts: Vec<bool> = (0..3).map(|slot| alu_inst(&program, slot).last()).collect();
    assert_eq!(lasts, vec![false, false, true]);
    let mul = alu_inst(&program, 1);
    assert_eq!(mul.src(1).sel, alu_src::KCACHE_BANK0 + 3);
}

#[test]
fn sources_default_to_destination_channel() {
    let program = assemble(indoc! {"
        00 ALU:
              0   z: ADD R4, -R1, |R2|
    "});
    let add = alu_inst(&program, 0);
    assert_eq!(add.dst_gpr(), 4);
    assert_eq!(add.dst_chan(), Chan::Z);
    assert_eq!(add.src(0).chan, Chan::Z);
    assert!(add.src(0).neg);
    assert!(add.src(1).abs);
}

#[test]
fn masked_write_and_properties() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: PRED_SETGT*2 ____, R0.x, 0.0f UPDATE_EXEC_MASK UPDATE_PRED CLAMP
    "});
    let inst = alu_inst(&program, 0);
    assert!(!inst.write_mask());
    assert!(inst.update_execute_mask());
    assert!(inst.update_pred());
    assert!(inst.clamp());
    assert_eq!(inst.opcode_name(), AluOp2::PredSetgt.name());
}

#[test]
fn too_many_literals_is_rejected() {
    let kind = semantic_error(indoc! {"
        00 ALU:
              0   x: MULADD R0.x, 2.0, 3.0, 4.0
                  y: MULADD R0.y, 5.0, 6.0, 7.0
    "});
    assert_eq!(kind, SemanticError::TooManyLiterals);
}

#[test]
fn instruction_on_occupied_unit_is_rejected() {
    let kind = semantic_error(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
                  x: MOV R2.x, R1.x
    "});
    assert_eq!(
        kind,
        SemanticError::UnitMismatch {
            declared: 'x',
            decoded: 't',
        }
    );
}

#[test]
fn write_mask_is_rejected_on_op3() {
    let kind = semantic_error(indoc! {"
        00 ALU:
              0   x: MULADD ____, R0.x, R1.x, R2.x
    "});
    assert_eq!(kind, SemanticError::WriteMaskOnOp3);
}

#[test]
fn mixed_relative_addressing_is_rejected() {
    let kind = semantic_error(indoc! {"
        00 ALU:
              0   x: ADD R0[AL].x, R1[AR.x].x, R2.x
    "});
    assert!(matches!(kind, SemanticError::RelIndexConflict { .. }));
}

#[test]
fn kcache_locks_pick_mode_from_range() {
    let program = assemble(indoc! {"
        00 ALU: KCACHE0(CB1:0-15) KCACHE1(CB2:16-47)
              0   x: MOV R0.x, KC1[0].x
    "});
    let cf = program.cf_insts[0];
    assert_eq!(cf.alu_word0().kcache_bank0(), 1);
    assert_eq!(cf.alu_word0().kcache_mode0(), KcacheMode::Lock1.raw());
    assert_eq!(cf.alu_word1().kcache_addr0(), 0);
    assert_eq!(cf.alu_word0().kcache_bank1(), 2);
    assert_eq!(cf.alu_word1().kcache_mode1(), KcacheMode::Lock2.raw());
    assert_eq!(cf.alu_word1().kcache_addr1(), 1);
}

#[test]
fn invalid_kcache_range_is_rejected() {
    let kind = semantic_error(indoc! {"
        00 ALU: KCACHE0(CB1:16-0)
              0   x: MOV R0.x, R1.x
    "});
    assert_eq!(kind, SemanticError::InvalidKcache("CB1:16-0".to_owned()));
}

#[test]
fn program_ending_in_alu_clause_gets_a_terminating_nop() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
    "});
    assert_eq!(program.cf_insts.len(), 2);
    assert!(program.cf_insts[1].end_of_program());
    assert!(program.cf_insts[1].word1().barrier());
    let flagged = program.cf_insts.iter().filter(|cf| cf.end_of_program()).count();
    assert_eq!(flagged, 1);
}

#[test]
fn empty_program_is_a_single_nop() {
    let program = assemble("");
    assert_eq!(program.cf_insts.len(), 1);
    assert!(program.cf_insts[0].end_of_program());
}

#[test]
fn last_control_flow_instruction_carries_end_of_program() {
    let program = assemble(indoc! {"
        00 NOP
        01 EXP_DONE: PIX0, R0
    "});
    assert_eq!(program.cf_insts.len(), 2);
    assert!(!program.cf_insts[0].end_of_program());
    assert!(program.cf_insts[1].end_of_program());
    assert_eq!(program.exports.num_pixels(), 1);
}

#[test]
fn wrong_address_annotation_is_rejected() {
    let kind = semantic_error(indoc! {"
        00 ALU: ADDR(5) CNT(1)
              0   x: MOV R0.x, R1.x
    "});
    assert_eq!(
        kind,
        SemanticError::AddrMismatch {
            computed: 32,
            specified: 5,
        }
    );
}

#[test]
fn wrong_count_annotation_is_rejected() {
    let kind = semantic_error(indoc! {"
        00 ALU: CNT(2)
              0   x: MOV R0.x, R1.x
    "});
    assert_eq!(
        kind,
        SemanticError::CountMismatch {
            computed: 1,
            specified: 2,
        }
    );
}

#[test]
fn control_flow_index_must_be_sequential() {
    let kind = semantic_error("01 NOP\n");
    assert_eq!(kind, SemanticError::CfPcMismatch { expected: 0, found: 1 });
}

#[test]
fn clause_index_continues_across_clauses() {
    let program = assemble(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
        01 ALU:
              1   x: MOV R0.x, R1.x
    "});
    assert_eq!(program.cf_insts[1].alu_word0().addr(), 33);

    let kind = semantic_error(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
        01 ALU:
              0   x: MOV R0.x, R1.x
    "});
    assert_eq!(kind, SemanticError::ClausePcMismatch { expected: 1, found: 0 });
}

#[test]
fn unknown_mnemonics_are_reported() {
    assert_eq!(
        semantic_error("00 FROB\n"),
        SemanticError::UnknownCfInstruction("FROB".to_owned())
    );
    assert_eq!(
        semantic_error(indoc! {"
            00 ALU:
                  0   x: FROB R0.x, R1.x
        "}),
        SemanticError::UnknownAluInstruction("FROB".to_owned())
    );
}

#[test]
fn instructions_after_end_of_program_are_rejected() {
    let kind = semantic_error(indoc! {"
        00 NOP
        END_OF_PROGRAM
        01 NOP
    "});
    assert_eq!(kind, SemanticError::InstructionAfterEnd);
}

#[test]
fn syntax_errors_carry_their_line() {
    let err = compile("00 NOP\n01 EXP_DONE: POS0,\n").unwrap_err();
    assert!(matches!(err, AssemblyError::Parse { .. }));
    assert_eq!(err.location().line, 2);
}

#[test]
fn semantic_errors_point_at_the_statement() {
    let err = compile("00 NOP\n01 NOP\n03 NOP\n").unwrap_err();
    assert_eq!(err.location().line, 3);
    assert_eq!(
        err.to_string(),
        "3:1: control flow index 3 does not match expected 2"
    );
}

#[test]
fn texture_clause_is_linked_after_alu_clauses() {
    let program = assemble(indoc! {"
        00 TEX: CNT(2)
              0   SAMPLE R1.xyzw, R0.xy00, t0, s0
              1   SAMPLE_L R2.xy__, R0.xyz0, t1, s1 LOD(-0.5) XOFFSET(1.5)
        01 ALU:
              2   x: MOV R0.x, R1.x
        02 EXP_DONE: PIX0, R1
    "});

    assert_eq!(program.alu_clause_base_address, 32);
    assert_eq!(program.tex_clause_base_address, 64);
    let tex = program.cf_insts[0];
    assert_eq!(tex.word0().addr(), 64);
    assert_eq!(tex.fetch_clause_len(), 2);
    assert_eq!(program.tex_clause_data.len(), 8);

    let words = program.to_words();
    assert_eq!(words.len(), 64 * 2 + 8);

    let word1 = TexWord1(program.tex_clause_data[5]);
    assert_eq!(word1.dst_gpr(), 2);
    assert_eq!(word1.lod_bias(), 0x7C);
    assert_eq!(word1.dst_sel(2), 7);
}

#[test]
fn fetch_clause_count_splits_into_count_3() {
    let mut source = String::from("00 TEX:\n");
    for i in 0..9 {
        source.push_str(&format!("      {i}   SAMPLE R{i}.xyzw, R0.xy00, t0, s0\n"));
    }
    let program = assemble(&source);
    let word1 = program.cf_insts[0].word1();
    assert_eq!(word1.count(), 0);
    assert!(word1.count_3());
    assert_eq!(program.cf_insts[0].fetch_clause_len(), 9);
}

#[test]
fn vertex_clause_rejects_texture_fetches() {
    let kind = semantic_error(indoc! {"
        00 VTX:
              0   SAMPLE R1.xyzw, R0.xy00, t0, s0
    "});
    assert!(matches!(kind, SemanticError::InvalidOperand(_)));
}

#[test]
fn vertex_fetch_properties_are_encoded() {
    let program = assemble(indoc! {"
        00 VTX:
              0   VFETCH R1.xyz1, R0.x, b2 FORMAT(FMT_32_32_32_FLOAT) MEGA(12) OFFSET(16)
    "});
    let FetchInst::Vtx(vtx) = FetchInst::from_words(
        [
            program.tex_clause_data[0],
            program.tex_clause_data[1],
            program.tex_clause_data[2],
        ],
        true,
    ) else {
        panic!("expected a vertex fetch");
    };
    assert_eq!(vtx.word0.buffer_id(), 2);
    assert_eq!(vtx.word0.mega_fetch_count(), 11);
    assert!(vtx.word2.mega_fetch());
    assert_eq!(vtx.word2.offset(), 16);
    assert_eq!(vtx.word1.dst_sel(3), 5);
    assert_eq!(vtx.word1.data_format(), DataFormat::Fmt32_32_32Float.raw());
}

#[test]
fn position_export_index_is_limited() {
    let kind = semantic_error("00 EXP_DONE: POS4, R0\n");
    assert!(matches!(kind, SemanticError::OutOfRange { .. }));
}

#[test]
fn burst_export_must_stay_within_registers() {
    let kind = semantic_error("00 EXP_DONE: POS0, R127 BURSTCNT(1)\n");
    assert_eq!(
        kind,
        SemanticError::OutOfRange {
            what: "last burst source register",
            value: 128,
            max: 127,
        }
    );
    assemble("00 EXP_DONE: POS0, R126 BURSTCNT(1)\n");
}

#[test]
fn previous_group_operand_must_name_previous_group() {
    let kind = semantic_error(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
              1   x: MOV R2.x, PV0.x
                  y: MOV R2.y, PS2
    "});
    assert_eq!(
        kind,
        SemanticError::PreviousGroupMismatch {
            expected: 0,
            found: 2,
        }
    );

    let program = assemble(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
              1   x: MOV R2.x, PV0.x
                  y: MOV R2.y, PS
    "});
    assert_eq!(alu_inst(&program, 1).src(0).sel, alu_src::PV);
}

#[test]
fn export_usage_includes_burst() {
    let program = assemble(indoc! {"
        00 EXP: PARAM3, R1 BURSTCNT(1)
        01 EXP_DONE: POS0, R0
    "});
    assert_eq!(program.exports.max_parameter, Some(4));
    assert_eq!(program.exports.num_parameters(), 5);
    assert_eq!(program.cf_insts[0].exp_swiz_word1().burst_count(), 1);
}

#[test]
fn stream_out_export_derives_component_mask() {
    let program = assemble(indoc! {"
        00 MEM_STREAM1: WRITE(4), R2.xy__ ARRAY_SIZE(3) ELEM_SIZE(3)
        01 EXP_DONE: POS0, R0
    "});
    let cf = program.cf_insts[0];
    assert_eq!(cf.exp_buf_word1().comp_mask(), 0b0011);
    assert_eq!(cf.exp_buf_word1().array_size(), 3);
    assert_eq!(cf.exp_word0().array_base(), 4);
    assert_eq!(cf.exp_word0().elem_size(), 3);
    assert_eq!(program.exports.streams, [false, true, false, false]);
}

#[test]
fn comments_are_kept_verbatim() {
    let program = assemble(indoc! {r#"
        ; $MODE = UniformRegister
        00 ALU:
        ; inside "the" clause
              0   x: MOV R0.x, R1.x
        01 EXP_DONE: POS0, R0
    "#});
    let lines: Vec<&str> = program.comment_lines().collect();
    assert_eq!(lines, vec![" $MODE = UniformRegister", r#" inside "the" clause"#]);
}

#[test]
fn disassembly_assembles_back_to_the_same_binary() {
    let program = assemble(indoc! {"
        00 TEX: CNT(1)
              0   SAMPLE R1.xyzw, R0.xy00, t0, s0
        01 ALU_PUSH_BEFORE: KCACHE0(CB0:0-15)
              1   x: MULADD R2.x, R1.x, KC0[1].x, (0x3E99999A, 0.3f)
                  y: DOT4 ____, R1.y, R1.y
                  t: RECIPSQRT_IEEE R3.w, -R1.z CLAMP
              2   x: MOV*2 R4.x, PV1.x
        02 POP: POP_CNT(1)
        03 EXP: PARAM0, R1.xyz1
        04 EXP_DONE: POS0, R2.xyzw
        END_OF_PROGRAM
    "});
    let binary = program.to_binary();

    let text = disassemble(&binary).unwrap();
    let again = assemble(&text);
    assert_eq!(again.to_binary(), binary);
}

#[test]
fn vertex_header_comments_set_registers_and_variables() {
    let mut header = VertexShaderHeader::default();
    parse_vertex_shader_comments(
        &mut header,
        [
            " plain comment",
            " $SQ_PGM_RESOURCES_VS.NUM_GPRS = 4",
            " $SQ_PGM_RESOURCES_VS.DX10_CLAMP = true",
            " $spi_vs_out_id[1].semantic_2 = 0x10",
            " $NUM_SPI_VS_OUT_ID = 2",
            " $ATTRIB_VARS[0].NAME = aPosition",
            " $ATTRIB_VARS[0].TYPE = Float3",
            " $UNIFORM_VARS[1].NAME = uMvp",
            " $MODE = UniformBlock",
            " $STREAM_OUT_STRIDE[2] = 16",
            " $INITIAL_VALUES[0].VALUE = 1.0, 2.0, 3.0, 4.0",
        ],
    )
    .unwrap();

    assert_eq!(header.regs.sq_pgm_resources_vs, 4 | 1 << 21);
    assert_eq!(header.regs.spi_vs_out_id[1], 0xFF10_FFFF);
    assert_eq!(header.regs.num_spi_vs_out_id, 2);
    assert_eq!(header.attrib_vars.len(), 1);
    assert_eq!(header.attrib_vars[0].name, "aPosition");
    assert_eq!(header.attrib_vars[0].var_type, ShaderVarType::from_name("FLOAT3").unwrap());
    assert_eq!(header.vars.uniform_vars.len(), 2);
    assert_eq!(header.vars.uniform_vars[0].block, -1);
    assert_eq!(header.vars.uniform_vars[1].name, "uMvp");
    assert_eq!(header.mode, ShaderMode::UniformBlock);
    assert_eq!(header.stream_out_stride, [0, 0, 16, 0]);
    assert_eq!(header.vars.initial_values[0].value, [1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn pixel_header_comments_accept_enum_fields() {
    let mut header = PixelShaderHeader::default();
    parse_pixel_shader_comments(
        &mut header,
        [
            "$DB_SHADER_CONTROL.Z_ORDER = EARLY_Z_THEN_LATE_Z",
            "$DB_SHADER_CONTROL.KILL_ENABLE = 1",
            "$SPI_PS_IN_CONTROL_1.FRONT_FACE_ENA = true",
            "$SPI_PS_INPUT_CNTL[3].SEMANTIC = 5",
            "$CB_SHADER_MASK.OUTPUT1_ENABLE = 0xF",
            "$SAMPLER_VARS[0].TYPE = SAMPLER2D",
        ],
    )
    .unwrap();

    assert_eq!(header.regs.db_shader_control, 1 << 4 | 1 << 6);
    assert_eq!(header.regs.spi_ps_in_control_1, 1 << 8);
    assert_eq!(header.regs.spi_ps_input_cntls[3], 5);
    assert_eq!(header.regs.cb_shader_mask, 0xF0);
    assert_eq!(header.vars.sampler_vars[0].location, 0);
}

#[test]
fn header_comment_errors() {
    let vertex = |line: &str| {
        let mut header = VertexShaderHeader::default();
        parse_vertex_shader_comments(&mut header, [line]).unwrap_err()
    };

    assert_eq!(vertex("$FOO = 1"), CommentError::UnknownKey("FOO".to_owned()));
    assert_eq!(
        vertex("$SQ_PGM_RESOURCES_VS.BOGUS = 1"),
        CommentError::UnknownMember {
            register: "SQ_PGM_RESOURCES_VS".to_owned(),
            member: "BOGUS".to_owned(),
        }
    );
    assert_eq!(
        vertex("$SPI_VS_OUT_ID[10].SEMANTIC_0 = 1"),
        CommentError::IndexOutOfRange {
            key: "SPI_VS_OUT_ID".to_owned(),
            index: 10,
            max: 10,
        }
    );
    assert!(matches!(vertex("$MODE.VALUE = 1"), CommentError::Shape { .. }));
    assert!(matches!(
        vertex("$SQ_PGM_RESOURCES_VS.NUM_GPRS = 300"),
        CommentError::InvalidValue { .. }
    ));
    assert!(matches!(vertex("$ATTRIB_VARS[0.NAME = a"), CommentError::Malformed(_)));

    let mut header = PixelShaderHeader::default();
    assert_eq!(
        parse_pixel_shader_comments(&mut header, ["$RING_ITEM_SIZE = 4"]).unwrap_err(),
        CommentError::UnknownKey("RING_ITEM_SIZE".to_owned())
    );
}

#[test]
fn header_blocks_have_fixed_size_without_variables() {
    let vertex = gfd::vertex_shader_header_bytes(&VertexShader::default()).unwrap();
    assert_eq!(vertex.len(), VERTEX_SHADER_HEADER_SIZE + 0x28);

    let pixel = gfd::pixel_shader_header_bytes(&gfd::PixelShader::default()).unwrap();
    assert_eq!(pixel.len(), PIXEL_SHADER_HEADER_SIZE + 0x28);
}

#[test]
fn header_block_relocates_variable_names() {
    let mut shader = VertexShader::default();
    parse_vertex_shader_comments(&mut shader.header, ["$UNIFORM_BLOCKS[0].NAME = ub"]).unwrap();
    let bytes = gfd::vertex_shader_header_bytes(&shader).unwrap();

    // Table: name pointer, offset, size. Then the string pool.
    let table = VERTEX_SHADER_HEADER_SIZE;
    assert_eq!(&bytes[table + 12..table + 16], b"ub\0\0");
    let name_ptr = u32::from_be_bytes(bytes[table..table + 4].try_into().unwrap());
    assert_eq!(name_ptr, 0xCA70_0000 | (table as u32 + 12));
}

fn be_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes(bytes[pos..pos + 4].try_into().unwrap())
}

/// (block type, data offset, data size) for every block of a container.
fn blocks(bytes: &[u8]) -> Vec<(u32, usize, usize)> {
    let mut pos = be_u32(bytes, 4) as usize;
    let mut out = Vec::new();
    while pos < bytes.len() {
        assert_eq!(&bytes[pos..pos + 4], b"BLK{");
        let size = be_u32(bytes, pos + 20) as usize;
        out.push((be_u32(bytes, pos + 16), pos + 32, size));
        pos += 32 + size;
    }
    out
}

#[test]
fn container_lists_header_program_and_end_blocks() {
    let program = assemble("00 EXP_DONE: POS0, R0\n");
    let file = GfdFile {
        vertex_shaders: vec![VertexShader {
            header: VertexShaderHeader::default(),
            program: program.to_binary(),
        }],
        pixel_shaders: Vec::new(),
    };

    let bytes = file.to_bytes(false).unwrap();
    assert_eq!(&bytes[..4], b"Gfx2");
    let types: Vec<u32> = blocks(&bytes).iter().map(|block| block.0).collect();
    assert_eq!(types, vec![3, 5, 1]);

    let (_, offset, size) = blocks(&bytes)[1];
    assert_eq!(&bytes[offset..offset + size], program.to_binary().as_slice());
}

#[test]
fn aligned_container_pads_program_blocks() {
    let file = GfdFile {
        vertex_shaders: vec![VertexShader {
            header: VertexShaderHeader::default(),
            program: vec![0xAB; 8],
        }],
        pixel_shaders: vec![gfd::PixelShader {
            header: PixelShaderHeader::default(),
            program: vec![0xCD; 8],
        }],
    };

    let bytes = file.to_bytes(true).unwrap();
    let found = blocks(&bytes);
    let types: Vec<u32> = found.iter().map(|block| block.0).collect();
    assert_eq!(types, vec![3, 2, 5, 6, 2, 7, 1]);
    for (block_type, offset, _) in found {
        if block_type == 5 || block_type == 7 {
            assert_eq!(offset % 0x200, 0);
        }
    }
}
