//! Bit layouts of every Latte instruction word.
//!
//! Positions and widths follow the R700 ISA and are a wire contract with the hardware; the
//! assembler writes them and the decompiler reads them back through the same types.

#[inline]
const fn field_mask(width: u32) -> u32 {
    ((1u64 << width) - 1) as u32
}

#[inline]
pub(crate) const fn get_field(word: u32, lo: u32, width: u32) -> u32 {
    (word >> lo) & field_mask(width)
}

#[inline]
pub(crate) const fn set_field(word: u32, lo: u32, width: u32, value: u32) -> u32 {
    let mask = field_mask(width) << lo;
    (word & !mask) | ((value << lo) & mask)
}

word! {
    /// `CF_WORD0`: jump target or clause address for NORMAL instructions.
    pub struct CfWord0 {
        addr / with_addr: 0, 32;
    }
}

word! {
    /// `CF_WORD1` for NORMAL instructions.
    pub struct CfWord1 {
        pop_count / with_pop_count: 0, 3;
        cf_const / with_cf_const: 3, 5;
        cond / with_cond: 8, 2;
        count / with_count: 10, 3;
        call_count / with_call_count: 13, 6;
        cf_inst / with_cf_inst: 23, 7;
        inst_type / with_inst_type: 28, 2;
    }
    flags {
        count_3 / with_count_3: 19;
        end_of_program / with_end_of_program: 21;
        valid_pixel_mode / with_valid_pixel_mode: 22;
        whole_quad_mode / with_whole_quad_mode: 30;
        barrier / with_barrier: 31;
    }
}

word! {
    /// `CF_ALU_WORD0`: clause address and the first half of the kcache setup.
    pub struct CfAluWord0 {
        addr / with_addr: 0, 22;
        kcache_bank0 / with_kcache_bank0: 22, 4;
        kcache_bank1 / with_kcache_bank1: 26, 4;
        kcache_mode0 / with_kcache_mode0: 30, 2;
    }
}

word! {
    /// `CF_ALU_WORD1`. `cf_inst` overlaps the type bits, which is how the ALU and
    /// ALU_EXTENDED encodings are told apart.
    pub struct CfAluWord1 {
        kcache_mode1 / with_kcache_mode1: 0, 2;
        kcache_addr0 / with_kcache_addr0: 2, 8;
        kcache_addr1 / with_kcache_addr1: 10, 8;
        count / with_count: 18, 7;
        cf_inst / with_cf_inst: 26, 4;
        inst_type / with_inst_type: 28, 2;
    }
    flags {
        alt_const / with_alt_const: 25;
        whole_quad_mode / with_whole_quad_mode: 30;
        barrier / with_barrier: 31;
    }
}

word! {
    /// `CF_ALLOC_EXPORT_WORD0`.
    pub struct ExpWord0 {
        array_base / with_array_base: 0, 13;
        export_type / with_export_type: 13, 2;
        rw_gpr / with_rw_gpr: 15, 7;
        index_gpr / with_index_gpr: 23, 7;
        elem_size / with_elem_size: 30, 2;
    }
    flags {
        rw_rel / with_rw_rel: 22;
    }
}

word! {
    /// `CF_ALLOC_EXPORT_WORD1_SWIZ`, used by pixel/position/parameter exports.
    pub struct ExpSwizWord1 {
        sel_x / with_sel_x: 0, 3;
        sel_y / with_sel_y: 3, 3;
        sel_z / with_sel_z: 6, 3;
        sel_w / with_sel_w: 9, 3;
        burst_count / with_burst_count: 17, 4;
        cf_inst / with_cf_inst: 23, 7;
    }
    flags {
        end_of_program / with_end_of_program: 21;
        valid_pixel_mode / with_valid_pixel_mode: 22;
        whole_quad_mode / with_whole_quad_mode: 30;
        barrier / with_barrier: 31;
    }
}

word! {
    /// `CF_ALLOC_EXPORT_WORD1_BUF`, used by memory and stream-out exports.
    pub struct ExpBufWord1 {
        array_size / with_array_size: 0, 12;
        comp_mask / with_comp_mask: 12, 4;
        burst_count / with_burst_count: 17, 4;
        cf_inst / with_cf_inst: 23, 7;
    }
    flags {
        end_of_program / with_end_of_program: 21;
        valid_pixel_mode / with_valid_pixel_mode: 22;
        whole_quad_mode / with_whole_quad_mode: 30;
        barrier / with_barrier: 31;
    }
}

impl ExpSwizWord1 {
    pub const fn sel(self, index: usize) -> u32 {
        match index {
            0 => self.sel_x(),
            1 => self.sel_y(),
            2 => self.sel_z(),
            _ => self.sel_w(),
        }
    }

    #[must_use]
    pub const fn with_sel(self, index: usize, value: u32) -> Self {
        match index {
            0 => self.with_sel_x(value),
            1 => self.with_sel_y(value),
            2 => self.with_sel_z(value),
            _ => self.with_sel_w(value),
        }
    }
}

word! {
    /// `ALU_WORD0`: the first two source operands, shared by OP2 and OP3.
    pub struct AluWord0 {
        src0_sel / with_src0_sel: 0, 9;
        src0_chan / with_src0_chan: 10, 2;
        src1_sel / with_src1_sel: 13, 9;
        src1_chan / with_src1_chan: 23, 2;
        index_mode / with_index_mode: 26, 3;
        pred_sel / with_pred_sel: 29, 2;
    }
    flags {
        src0_rel / with_src0_rel: 9;
        src0_neg / with_src0_neg: 12;
        src1_rel / with_src1_rel: 22;
        src1_neg / with_src1_neg: 25;
        last / with_last: 31;
    }
}

word! {
    /// `ALU_WORD1_OP2`. The upper bits of `alu_inst` share storage with `encoding`, which
    /// is therefore zero for every OP2 instruction.
    pub struct AluWord1Op2 {
        omod / with_omod: 5, 2;
        alu_inst / with_alu_inst: 7, 11;
        encoding / with_encoding: 15, 3;
        bank_swizzle / with_bank_swizzle: 18, 3;
        dst_gpr / with_dst_gpr: 21, 7;
        dst_chan / with_dst_chan: 29, 2;
    }
    flags {
        src0_abs / with_src0_abs: 0;
        src1_abs / with_src1_abs: 1;
        update_execute_mask / with_update_execute_mask: 2;
        update_pred / with_update_pred: 3;
        write_mask / with_write_mask: 4;
        dst_rel / with_dst_rel: 28;
        clamp / with_clamp: 31;
    }
}

word! {
    /// `ALU_WORD1_OP3`. `alu_inst` covers the encoding bits; every OP3 opcode has a
    /// non-zero encoding.
    pub struct AluWord1Op3 {
        src2_sel / with_src2_sel: 0, 9;
        src2_chan / with_src2_chan: 10, 2;
        alu_inst / with_alu_inst: 13, 5;
        encoding / with_encoding: 15, 3;
        bank_swizzle / with_bank_swizzle: 18, 3;
        dst_gpr / with_dst_gpr: 21, 7;
        dst_chan / with_dst_chan: 29, 2;
    }
    flags {
        src2_rel / with_src2_rel: 9;
        src2_neg / with_src2_neg: 12;
        dst_rel / with_dst_rel: 28;
        clamp / with_clamp: 31;
    }
}

word! {
    /// `TEX_WORD0`.
    pub struct TexWord0 {
        tex_inst / with_tex_inst: 0, 5;
        resource_id / with_resource_id: 8, 8;
        src_gpr / with_src_gpr: 16, 7;
    }
    flags {
        bc_frac_mode / with_bc_frac_mode: 5;
        fetch_whole_quad / with_fetch_whole_quad: 7;
        src_rel / with_src_rel: 23;
        alt_const / with_alt_const: 24;
    }
}

word! {
    /// `TEX_WORD1`. A set `coord_type_*` bit means the axis is normalized.
    pub struct TexWord1 {
        dst_gpr / with_dst_gpr: 0, 7;
        dst_sel_x / with_dst_sel_x: 9, 3;
        dst_sel_y / with_dst_sel_y: 12, 3;
        dst_sel_z / with_dst_sel_z: 15, 3;
        dst_sel_w / with_dst_sel_w: 18, 3;
        lod_bias / with_lod_bias: 21, 7;
    }
    flags {
        dst_rel / with_dst_rel: 7;
        coord_type_x / with_coord_type_x: 28;
        coord_type_y / with_coord_type_y: 29;
        coord_type_z / with_coord_type_z: 30;
        coord_type_w / with_coord_type_w: 31;
    }
}

word! {
    /// `TEX_WORD2`.
    pub struct TexWord2 {
        offset_x / with_offset_x: 0, 5;
        offset_y / with_offset_y: 5, 5;
        offset_z / with_offset_z: 10, 5;
        sampler_id / with_sampler_id: 15, 5;
        src_sel_x / with_src_sel_x: 20, 3;
        src_sel_y / with_src_sel_y: 23, 3;
        src_sel_z / with_src_sel_z: 26, 3;
        src_sel_w / with_src_sel_w: 29, 3;
    }
}

word! {
    /// `VTX_WORD0`.
    pub struct VtxWord0 {
        vtx_inst / with_vtx_inst: 0, 5;
        fetch_type / with_fetch_type: 5, 2;
        buffer_id / with_buffer_id: 8, 8;
        src_gpr / with_src_gpr: 16, 7;
        src_sel_x / with_src_sel_x: 24, 2;
        mega_fetch_count / with_mega_fetch_count: 26, 6;
    }
    flags {
        fetch_whole_quad / with_fetch_whole_quad: 7;
        src_rel / with_src_rel: 23;
    }
}

word! {
    /// `VTX_WORD1`. Semantic fetches reuse the low byte as `semantic_id`.
    pub struct VtxWord1 {
        dst_gpr / with_dst_gpr: 0, 7;
        semantic_id / with_semantic_id: 0, 8;
        dst_sel_x / with_dst_sel_x: 9, 3;
        dst_sel_y / with_dst_sel_y: 12, 3;
        dst_sel_z / with_dst_sel_z: 15, 3;
        dst_sel_w / with_dst_sel_w: 18, 3;
        data_format / with_data_format: 22, 6;
        num_format_all / with_num_format_all: 28, 2;
    }
    flags {
        dst_rel / with_dst_rel: 7;
        use_const_fields / with_use_const_fields: 21;
        format_comp_all / with_format_comp_all: 30;
        srf_mode_all / with_srf_mode_all: 31;
    }
}

word! {
    /// `VTX_WORD2`.
    pub struct VtxWord2 {
        offset / with_offset: 0, 16;
        endian_swap / with_endian_swap: 16, 2;
    }
    flags {
        const_buf_no_stride / with_const_buf_no_stride: 18;
        mega_fetch / with_mega_fetch: 19;
        alt_const / with_alt_const: 20;
    }
}

impl TexWord1 {
    pub const fn dst_sel(self, index: usize) -> u32 {
        match index {
            0 => self.dst_sel_x(),
            1 => self.dst_sel_y(),
            2 => self.dst_sel_z(),
            _ => self.dst_sel_w(),
        }
    }

    #[must_use]
    pub const fn with_dst_sel(self, index: usize, value: u32) -> Self {
        match index {
            0 => self.with_dst_sel_x(value),
            1 => self.with_dst_sel_y(value),
            2 => self.with_dst_sel_z(value),
            _ => self.with_dst_sel_w(value),
        }
    }

    pub const fn coord_normalized(self, index: usize) -> bool {
        match index {
            0 => self.coord_type_x(),
            1 => self.coord_type_y(),
            2 => self.coord_type_z(),
            _ => self.coord_type_w(),
        }
    }

    #[must_use]
    pub const fn with_coord_normalized(self, index: usize, value: bool) -> Self {
        match index {
            0 => self.with_coord_type_x(value),
            1 => self.with_coord_type_y(value),
            2 => self.with_coord_type_z(value),
            _ => self.with_coord_type_w(value),
        }
    }
}

impl TexWord2 {
    pub const fn src_sel(self, index: usize) -> u32 {
        match index {
            0 => self.src_sel_x(),
            1 => self.src_sel_y(),
            2 => self.src_sel_z(),
            _ => self.src_sel_w(),
        }
    }

    #[must_use]
    pub const fn with_src_sel(self, index: usize, value: u32) -> Self {
        match index {
            0 => self.with_src_sel_x(value),
            1 => self.with_src_sel_y(value),
            2 => self.with_src_sel_z(value),
            _ => self.with_src_sel_w(value),
        }
    }
}

impl VtxWord1 {
    pub const fn dst_sel(self, index: usize) -> u32 {
        match index {
            0 => self.dst_sel_x(),
            1 => self.dst_sel_y(),
            2 => self.dst_sel_z(),
            _ => self.dst_sel_w(),
        }
    }

    #[must_use]
    pub const fn with_dst_sel(self, index: usize, value: u32) -> Self {
        match index {
            0 => self.with_dst_sel_x(value),
            1 => self.with_dst_sel_y(value),
            2 => self.with_dst_sel_z(value),
            _ => self.with_dst_sel_w(value),
        }
    }
}
