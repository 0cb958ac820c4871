use pretty_assertions::assert_eq;

use crate::*;

fn mov(dst: u32, chan: u32, src: u32, last: bool) -> AluInst {
    AluInst::new(
        AluWord0::default()
            .with_src0_sel(src)
            .with_src0_chan(chan)
            .with_last(last)
            .0,
        AluWord1Op2::default()
            .with_alu_inst(AluOp2::Mov.raw())
            .with_write_mask(true)
            .with_dst_gpr(dst)
            .with_dst_chan(chan)
            .0,
    )
}

fn op2(op: AluOp2, dst_chan: u32, last: bool) -> AluInst {
    AluInst::new(
        AluWord0::default().with_last(last).0,
        AluWord1Op2::default()
            .with_alu_inst(op.raw())
            .with_write_mask(true)
            .with_dst_chan(dst_chan)
            .0,
    )
}

fn push_inst(words: &mut Vec<u32>, inst: AluInst) {
    words.push(inst.word0.0);
    words.push(inst.word1);
}

/// ALU clause with one `MOV R0.x, R0.x` group, followed by a position export.
fn minimal_program() -> Vec<u32> {
    let mut words = vec![
        CfAluWord0::default().with_addr(2).0,
        CfAluWord1::default()
            .with_cf_inst(CfAluInst::Alu.raw())
            .with_barrier(true)
            .0,
        ExpWord0::default()
            .with_array_base(EXPORT_POSITION_BASE)
            .with_export_type(ExportType::Position.raw())
            .0,
        ExpSwizWord1::default()
            .with_sel_x(0)
            .with_sel_y(1)
            .with_sel_z(2)
            .with_sel_w(3)
            .with_cf_inst(CfExpInst::ExpDone.raw())
            .with_end_of_program(true)
            .with_barrier(true)
            .0,
    ];
    push_inst(&mut words, mov(0, 0, 0, true));
    words
}

#[test]
fn word_fields_round_trip_through_builders() {
    let word = CfWord1::default()
        .with_pop_count(5)
        .with_cond(CfCond::NotBool.raw())
        .with_count(7)
        .with_count_3(true)
        .with_cf_inst(CfInst::LoopEnd.raw())
        .with_barrier(true);

    assert_eq!(word.pop_count(), 5);
    assert_eq!(word.cond(), 3);
    assert_eq!(word.count(), 7);
    assert!(word.count_3());
    assert_eq!(word.cf_inst(), 5);
    assert!(word.barrier());
    assert!(!word.end_of_program());
    assert_eq!(word.0 >> 31, 1);
}

#[test]
fn setters_truncate_to_field_width() {
    let word = AluWord0::default().with_src0_chan(0x7);
    assert_eq!(word.src0_chan(), 3);
    assert_eq!(word.src0_neg(), false);
}

#[test]
fn cf_alu_opcode_implies_inst_type() {
    let alu = ControlFlowInst::new(0, CfAluWord1::default().with_cf_inst(CfAluInst::AluPushBefore.raw()).0);
    assert_eq!(alu.inst_type(), CfInstType::Alu);
    assert_eq!(alu.opcode(), Some(CfOpcode::Alu(CfAluInst::AluPushBefore)));

    let ext = ControlFlowInst::new(0, CfAluWord1::default().with_cf_inst(CfAluInst::AluBreak.raw()).0);
    assert_eq!(ext.inst_type(), CfInstType::AluExtended);

    let exp = ControlFlowInst::new(0, ExpSwizWord1::default().with_cf_inst(CfExpInst::MemExport.raw()).0);
    assert_eq!(exp.inst_type(), CfInstType::Export);

    let nop = ControlFlowInst::new(0, CfWord1::default().with_cf_inst(CfInst::Kill.raw()).0);
    assert_eq!(nop.inst_type(), CfInstType::Normal);
}

#[test]
fn op3_encoding_is_detected_from_opcode_bits() {
    for op in AluOp3::ALL {
        let inst = AluInst::new(0, AluWord1Op3::default().with_alu_inst(op.raw()).0);
        assert!(inst.is_op3(), "{op} should decode as OP3");
        assert_eq!(inst.opcode(), Some(AluOpcode::Op3(*op)));
        assert!(inst.write_mask());
    }
    for op in AluOp2::ALL {
        let inst = AluInst::new(0, AluWord1Op2::default().with_alu_inst(op.raw()).0);
        assert!(!inst.is_op3(), "{op} should decode as OP2");
    }
}

#[test]
fn mnemonic_lookup_accepts_aliases() {
    assert_eq!(AluOpcode::from_name("MOV"), Some(AluOpcode::Op2(AluOp2::Mov)));
    assert_eq!(AluOpcode::from_name("RSQ_e"), Some(AluOpcode::Op2(AluOp2::RecipsqrtIeee)));
    assert_eq!(AluOpcode::from_name("MULADD_e"), Some(AluOpcode::Op3(AluOp3::MuladdIeee)));
    assert_eq!(AluOpcode::from_name("LOG_sat"), Some(AluOpcode::Op2(AluOp2::LogClamped)));
    assert_eq!(AluOpcode::from_name("mov"), None);
    assert_eq!(TexInst::from_name("SAMPLE_C_LZ"), Some(TexInst::SampleCLz));
    assert_eq!(CfInst::from_name("LOOP_START_DX10"), Some(CfInst::LoopStartDx10));
}

#[test]
fn every_name_maps_back_to_its_opcode() {
    for op in AluOp2::ALL {
        assert_eq!(AluOp2::from_name(op.name()), Some(*op));
        assert_eq!(AluOp2::from_raw(op.raw()), Some(*op));
    }
    for op in CfInst::ALL {
        assert_eq!(CfInst::from_name(op.name()), Some(*op));
    }
}

#[test]
fn alu_flags_describe_unit_placement() {
    assert!(AluOp2::Dot4.flags().contains(AluFlags::REDUCTION));
    assert!(!AluOp2::RecipIeee.flags().contains(AluFlags::VECTOR));
    assert!(AluOp2::SeteInt.flags().contains(AluFlags::INT_IN | AluFlags::INT_OUT));
    assert_eq!(AluOp2::Nop.num_srcs(), 0);
    assert_eq!(AluOp3::Cnde.num_srcs(), 3);
}

#[test]
fn group_units_spill_into_t() {
    let mut units = AluGroupUnits::default();
    assert_eq!(units.add(&op2(AluOp2::Mov, 0, false)), Some(AluUnit::X));
    assert_eq!(units.add(&op2(AluOp2::Mov, 0, false)), Some(AluUnit::T));
    assert_eq!(units.add(&op2(AluOp2::Mov, 0, false)), None);
}

#[test]
fn group_units_place_transcendental_ops_in_t() {
    let mut units = AluGroupUnits::default();
    assert_eq!(units.add(&op2(AluOp2::RecipIeee, 2, false)), Some(AluUnit::T));
    assert!(!units.is_used(AluUnit::Z));
    assert_eq!(units.add(&op2(AluOp2::SqrtIeee, 1, false)), None);
}

#[test]
fn group_units_never_spill_vector_only_ops() {
    let mut units = AluGroupUnits::default();
    assert_eq!(units.add(&op2(AluOp2::Dot4, 0, false)), Some(AluUnit::X));
    assert_eq!(units.add(&op2(AluOp2::Dot4, 0, false)), None);
}

#[test]
fn group_decode_reads_literal_pool() {
    let add = AluInst::new(
        AluWord0::default()
            .with_src0_sel(alu_src::LITERAL)
            .with_src0_chan(1)
            .with_src1_sel(3)
            .with_last(true)
            .0,
        AluWord1Op2::default()
            .with_alu_inst(AluOp2::Add.raw())
            .with_write_mask(true)
            .0,
    );
    let mut words = Vec::new();
    push_inst(&mut words, add);
    words.extend([0x3f80_0000, 0x4000_0000]);
    push_inst(&mut words, mov(1, 1, 2, true));

    let group = AluGroup::decode(&words, 0).expect("decode group");
    assert_eq!(group.insts.len(), 1);
    assert_eq!(group.literals, vec![0x3f80_0000, 0x4000_0000]);
    assert_eq!(group.next_slot, 2);

    let groups = decode_alu_clause(&words, 0, 3).expect("decode clause");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].units, vec![AluUnit::Y]);
}

#[test]
fn group_without_last_is_rejected() {
    let mut words = Vec::new();
    for chan in 0..4 {
        push_inst(&mut words, op2(AluOp2::Mov, chan, false));
    }
    push_inst(&mut words, op2(AluOp2::RecipIeee, 0, false));
    push_inst(&mut words, op2(AluOp2::Mov, 0, true));

    let err = AluGroup::decode(&words, 0).unwrap_err();
    assert_eq!(err.word_index, 8);
    assert!(err.message.contains("without LAST"), "{err}");
}

#[test]
fn group_past_end_of_binary_is_rejected() {
    let mut words = Vec::new();
    push_inst(&mut words, mov(0, 0, 0, false));
    let err = AluGroup::decode(&words, 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Latte decode error at word 2: ALU group runs past end of binary"
    );
}

#[test]
fn read_words_requires_whole_words() {
    assert_eq!(read_words(&[1, 0, 0, 0, 2, 0, 0, 0]).unwrap(), vec![1, 2]);
    assert!(read_words(&[1, 2, 3]).is_err());
}

#[test]
fn cf_program_stops_at_end_of_program() {
    let mut words = minimal_program();
    words.extend([0, 0]);
    let cf = decode_cf_program(&words);
    assert_eq!(cf.len(), 2);
    assert!(cf[1].end_of_program());
}

#[test]
fn fetch_clause_distinguishes_vertex_fetches() {
    let words = [
        TexWord0::default().with_tex_inst(TexInst::Sample.raw()).0,
        0,
        0,
        0,
        VtxWord0::default().with_vtx_inst(VtxInst::Fetch.raw()).0,
        0,
        0,
        0,
    ];
    let insts = decode_fetch_clause(&words, 0, 2, false).unwrap();
    assert!(matches!(insts[0], FetchInst::Tex(_)));
    assert!(matches!(insts[1], FetchInst::Vtx(_)));
}

#[test]
fn disassembles_minimal_program() {
    let text = disassemble_words(&minimal_program()).unwrap();
    assert_eq!(
        text,
        "00 ALU: ADDR(2) CNT(1)\n\
         \x20     0   x: MOV            R0.x, R0.x\n\
         01 EXP_DONE: POS0, R0.xyzw\n\
         END_OF_PROGRAM\n"
    );
}

#[test]
fn disassembles_sources_and_properties() {
    let inst = AluInst::new(
        AluWord0::default()
            .with_src0_sel(alu_src::PV)
            .with_src0_chan(2)
            .with_src0_neg(true)
            .with_src1_sel(alu_src::KCACHE_BANK1 + 3)
            .with_src1_chan(3)
            .with_last(true)
            .0,
        AluWord1Op2::default()
            .with_alu_inst(AluOp2::Mul.raw())
            .with_src1_abs(true)
            .with_omod(OutputModifier::Mul2.raw())
            .with_dst_gpr(4)
            .with_dst_chan(1)
            .with_write_mask(true)
            .with_clamp(true)
            .0,
    );
    assert_eq!(
        disasm::alu_inst_text(3, AluUnit::Y, &inst, &[]),
        "y: MUL*2          R4.y, -PV2.z, |KC1[3].w| CLAMP"
    );
}

#[test]
fn disassembles_texture_fetch() {
    let inst = FetchInst::Tex(TexFetchInst {
        word0: TexWord0::default()
            .with_tex_inst(TexInst::Sample.raw())
            .with_resource_id(1)
            .with_src_gpr(2),
        word1: TexWord1::default()
            .with_dst_gpr(3)
            .with_dst_sel_x(0)
            .with_dst_sel_y(1)
            .with_dst_sel_z(2)
            .with_dst_sel_w(7)
            .with_coord_type_x(true)
            .with_coord_type_y(true)
            .with_lod_bias(0x7c),
        word2: TexWord2::default()
            .with_sampler_id(1)
            .with_src_sel_x(0)
            .with_src_sel_y(1)
            .with_src_sel_z(4)
            .with_src_sel_w(4)
            .with_offset_x(0x1f),
    });
    assert_eq!(
        disasm::fetch_inst_text(&inst),
        "SAMPLE          R3.xyz_, R2.xy00, t1, s1 DENORM(zw) LOD(-0.5) XOFFSET(-0.5)"
    );
}

#[test]
fn fixed_point_helpers_sign_extend() {
    assert_eq!(disasm::lod_bias_value(0x08), 1.0);
    assert_eq!(disasm::lod_bias_value(0x40), -8.0);
    assert_eq!(disasm::texel_offset_value(0x03), 1.5);
    assert_eq!(disasm::texel_offset_value(0x10), -8.0);
}

#[test]
fn kcache_mode_follows_range_size() {
    assert_eq!(KcacheMode::for_range(0, 15), KcacheMode::Lock1);
    assert_eq!(KcacheMode::for_range(16, 47), KcacheMode::Lock2);
    assert_eq!(KcacheMode::for_range(0, 7), KcacheMode::Nop);
}
