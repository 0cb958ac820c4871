//! Enumerated field values and the ALU source selector space.

named_enum! {
    /// `CF_INST_TYPE`, bits 28..30 of the second control flow word.
    pub enum CfInstType {
        Normal = 0 => "NORMAL",
        Export = 1 => "EXPORT",
        Alu = 2 => "ALU",
        AluExtended = 3 => "ALU_EXTENDED",
    }
}

named_enum! {
    pub enum CfCond {
        Active = 0 => "ACTIVE",
        False = 1 => "FALSE",
        Bool = 2 => "BOOL",
        NotBool = 3 => "NOT_BOOL",
    }
}

named_enum! {
    pub enum KcacheMode {
        Nop = 0 => "NOP",
        Lock1 = 1 => "LOCK_1",
        Lock2 = 2 => "LOCK_2",
        LockLoopIndex = 3 => "LOCK_LOOP_INDEX",
    }
}

impl KcacheMode {
    /// Lock mode implied by an inclusive constant range `start..=end`.
    pub const fn for_range(start: u32, end: u32) -> Self {
        match end.wrapping_sub(start) {
            15 => Self::Lock1,
            31 => Self::Lock2,
            _ => Self::Nop,
        }
    }

    /// Number of constants locked by this mode, when it locks a fixed window.
    pub const fn window_size(self) -> Option<u32> {
        match self {
            Self::Lock1 => Some(16),
            Self::Lock2 => Some(32),
            _ => None,
        }
    }
}

named_enum! {
    /// Export targets of the swizzle form.
    pub enum ExportType {
        Pixel = 0 => "PIXEL",
        Position = 1 => "POS",
        Parameter = 2 => "PARAM",
    }
}

named_enum! {
    /// Export targets of the buffer form.
    pub enum MemExportType {
        Write = 0 => "WRITE",
        WriteInd = 1 => "WRITE_IND",
        WriteAck = 2 => "WRITE_ACK",
        WriteIndAck = 3 => "WRITE_IND_ACK",
    }
}

/// Position exports address array bases 60..63.
pub const EXPORT_POSITION_BASE: u32 = 60;

named_enum! {
    pub enum IndexMode {
        ArX = 0 => "AR.x",
        ArY = 1 => "AR.y",
        ArZ = 2 => "AR.z",
        ArW = 3 => "AR.w",
        Loop = 4 => "AL",
        Global = 5 => "GLOBAL",
        GlobalArX = 6 => "GLOBAL_AR.x",
    }
}

named_enum! {
    pub enum PredSel {
        Off = 0 => "PRED_SEL_OFF",
        Zero = 2 => "PRED_SEL_ZERO",
        One = 3 => "PRED_SEL_ONE",
    }
}

named_enum! {
    /// Output modifier applied to an OP2 result.
    pub enum OutputModifier {
        Off = 0 => "",
        Mul2 = 1 => "*2",
        Mul4 = 2 => "*4",
        Div2 = 3 => "/2",
    }
}

named_enum! {
    /// Bank swizzles of instructions in the X/Y/Z/W units.
    pub enum VecBankSwizzle {
        Vec012 = 0 => "VEC_012",
        Vec021 = 1 => "VEC_021",
        Vec120 = 2 => "VEC_120",
        Vec102 = 3 => "VEC_102",
        Vec201 = 4 => "VEC_201",
        Vec210 = 5 => "VEC_210",
    }
}

named_enum! {
    /// Bank swizzles of instructions in the T unit.
    pub enum ScalarBankSwizzle {
        Scl210 = 0 => "SCL_210",
        Scl122 = 1 => "SCL_122",
        Scl212 = 2 => "SCL_212",
        Scl221 = 3 => "SCL_221",
    }
}

named_enum! {
    pub enum TexDim {
        Dim1D = 0 => "1D",
        Dim2D = 1 => "2D",
        Dim3D = 2 => "3D",
        Cube = 3 => "CUBE",
        Dim1DArray = 4 => "1D_ARRAY",
        Dim2DArray = 5 => "2D_ARRAY",
        Dim2DMsaa = 6 => "2D_MSAA",
        Dim2DArrayMsaa = 7 => "2D_ARRAY_MSAA",
    }
}

named_enum! {
    pub enum VtxFetchType {
        Vertex = 0 => "VERTEX",
        Instance = 1 => "INSTANCE",
        NoIndexOffset = 2 => "NO_INDEX_OFFSET",
    }
}

named_enum! {
    pub enum NumFormat {
        Norm = 0 => "NORM",
        Int = 1 => "INT",
        Scaled = 2 => "SCALED",
    }
}

named_enum! {
    pub enum FormatComp {
        Unsigned = 0 => "UNSIGNED",
        Signed = 1 => "SIGNED",
    }
}

named_enum! {
    pub enum SrfMode {
        ZeroClampMinusOne = 0 => "ZERO_CLAMP_MINUS_ONE",
        NoZero = 1 => "NO_ZERO",
    }
}

named_enum! {
    pub enum EndianSwap {
        NoSwap = 0 => "NONE",
        EightIn16 = 1 => "8IN16",
        EightIn32 = 2 => "8IN32",
    }
}

named_enum! {
    /// Surface data formats addressable by vertex fetches.
    pub enum DataFormat {
        Invalid = 0 => "FMT_INVALID",
        Fmt8 = 1 => "FMT_8",
        Fmt4_4 = 2 => "FMT_4_4",
        Fmt3_3_2 = 3 => "FMT_3_3_2",
        Fmt16 = 5 => "FMT_16",
        Fmt16Float = 6 => "FMT_16_FLOAT",
        Fmt8_8 = 7 => "FMT_8_8",
        Fmt5_6_5 = 8 => "FMT_5_6_5",
        Fmt6_5_5 = 9 => "FMT_6_5_5",
        Fmt1_5_5_5 = 10 => "FMT_1_5_5_5",
        Fmt4_4_4_4 = 11 => "FMT_4_4_4_4",
        Fmt5_5_5_1 = 12 => "FMT_5_5_5_1",
        Fmt32 = 13 => "FMT_32",
        Fmt32Float = 14 => "FMT_32_FLOAT",
        Fmt16_16 = 15 => "FMT_16_16",
        Fmt16_16Float = 16 => "FMT_16_16_FLOAT",
        Fmt8_24 = 17 => "FMT_8_24",
        Fmt8_24Float = 18 => "FMT_8_24_FLOAT",
        Fmt24_8 = 19 => "FMT_24_8",
        Fmt24_8Float = 20 => "FMT_24_8_FLOAT",
        Fmt10_11_11 = 21 => "FMT_10_11_11",
        Fmt10_11_11Float = 22 => "FMT_10_11_11_FLOAT",
        Fmt11_11_10 = 23 => "FMT_11_11_10",
        Fmt11_11_10Float = 24 => "FMT_11_11_10_FLOAT",
        Fmt2_10_10_10 = 25 => "FMT_2_10_10_10",
        Fmt8_8_8_8 = 26 => "FMT_8_8_8_8",
        Fmt10_10_10_2 = 27 => "FMT_10_10_10_2",
        FmtX24_8_32Float = 28 => "FMT_X24_8_32_FLOAT",
        Fmt32_32 = 29 => "FMT_32_32",
        Fmt32_32Float = 30 => "FMT_32_32_FLOAT",
        Fmt16_16_16_16 = 31 => "FMT_16_16_16_16",
        Fmt16_16_16_16Float = 32 => "FMT_16_16_16_16_FLOAT",
        Fmt32_32_32_32 = 34 => "FMT_32_32_32_32",
        Fmt32_32_32_32Float = 35 => "FMT_32_32_32_32_FLOAT",
        Fmt1 = 37 => "FMT_1",
        FmtGbGr = 39 => "FMT_GB_GR",
        FmtBgRg = 40 => "FMT_BG_RG",
        Fmt32As8 = 41 => "FMT_32_AS_8",
        Fmt32As8_8 = 42 => "FMT_32_AS_8_8",
        Fmt5_9_9_9SharedExp = 43 => "FMT_5_9_9_9_SHAREDEXP",
        Fmt8_8_8 = 44 => "FMT_8_8_8",
        Fmt16_16_16 = 45 => "FMT_16_16_16",
        Fmt16_16_16Float = 46 => "FMT_16_16_16_FLOAT",
        Fmt32_32_32 = 47 => "FMT_32_32_32",
        Fmt32_32_32Float = 48 => "FMT_32_32_32_FLOAT",
        FmtBc1 = 49 => "FMT_BC1",
        FmtBc2 = 50 => "FMT_BC2",
        FmtBc3 = 51 => "FMT_BC3",
        FmtBc4 = 52 => "FMT_BC4",
        FmtBc5 = 53 => "FMT_BC5",
    }
}

/// Component selector used by fetch and export swizzles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sel {
    X,
    Y,
    Z,
    W,
    Zero,
    One,
    Mask,
}

impl Sel {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            3 => Self::W,
            4 => Self::Zero,
            5 => Self::One,
            7 => Self::Mask,
            _ => return None,
        })
    }

    pub const fn raw(self) -> u32 {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::W => 3,
            Self::Zero => 4,
            Self::One => 5,
            Self::Mask => 7,
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'x' => Self::X,
            'y' => Self::Y,
            'z' => Self::Z,
            'w' => Self::W,
            '0' => Self::Zero,
            '1' => Self::One,
            '_' => Self::Mask,
            _ => return None,
        })
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
            Self::Zero => '0',
            Self::One => '1',
            Self::Mask => '_',
        }
    }

    /// Renders a raw selector, using `?` for the reserved encoding.
    pub fn char_for_raw(raw: u32) -> char {
        Self::from_raw(raw).map_or('?', Self::as_char)
    }
}

/// A vector channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chan {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl Chan {
    pub const ALL: [Chan; 4] = [Chan::X, Chan::Y, Chan::Z, Chan::W];

    pub const fn from_raw(raw: u32) -> Self {
        match raw & 3 {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            _ => Self::W,
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'x' => Self::X,
            'y' => Self::Y,
            'z' => Self::Z,
            'w' => Self::W,
            _ => return None,
        })
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// An execution unit of an ALU group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AluUnit {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
    T = 4,
}

impl AluUnit {
    pub const fn from_chan(chan: Chan) -> Self {
        match chan {
            Chan::X => Self::X,
            Chan::Y => Self::Y,
            Chan::Z => Self::Z,
            Chan::W => Self::W,
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'x' => Self::X,
            'y' => Self::Y,
            'z' => Self::Z,
            'w' => Self::W,
            't' => Self::T,
            _ => return None,
        })
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
            Self::T => 't',
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_vector(self) -> bool {
        !matches!(self, Self::T)
    }
}

/// Selector values of the 9-bit ALU source fields.
pub mod alu_src {
    pub const GPR_END: u32 = 128;
    pub const KCACHE_BANK0: u32 = 128;
    pub const KCACHE_BANK1: u32 = 160;
    pub const KCACHE_END: u32 = 192;
    pub const ONE_DOUBLE_LOW: u32 = 244;
    pub const ONE_DOUBLE_HIGH: u32 = 245;
    pub const HALF_DOUBLE_LOW: u32 = 246;
    pub const HALF_DOUBLE_HIGH: u32 = 247;
    pub const IMM_0: u32 = 248;
    pub const IMM_1: u32 = 249;
    pub const IMM_1_INT: u32 = 250;
    pub const IMM_M1_INT: u32 = 251;
    pub const IMM_0_5: u32 = 252;
    pub const LITERAL: u32 = 253;
    pub const PV: u32 = 254;
    pub const PS: u32 = 255;
    pub const CFILE: u32 = 256;
    pub const CFILE_END: u32 = 512;
}

/// Decoded meaning of an ALU source selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluSource {
    Gpr(u32),
    Kcache0(u32),
    Kcache1(u32),
    ConstFile(u32),
    OneDoubleLow,
    OneDoubleHigh,
    HalfDoubleLow,
    HalfDoubleHigh,
    Imm0,
    Imm1,
    Imm1Int,
    ImmM1Int,
    Imm05,
    Literal,
    PrevVector,
    PrevScalar,
    Reserved(u32),
}

impl AluSource {
    pub const fn from_sel(sel: u32) -> Self {
        use alu_src::*;
        match sel {
            0..=127 => Self::Gpr(sel),
            KCACHE_BANK0..=159 => Self::Kcache0(sel - KCACHE_BANK0),
            KCACHE_BANK1..=191 => Self::Kcache1(sel - KCACHE_BANK1),
            ONE_DOUBLE_LOW => Self::OneDoubleLow,
            ONE_DOUBLE_HIGH => Self::OneDoubleHigh,
            HALF_DOUBLE_LOW => Self::HalfDoubleLow,
            HALF_DOUBLE_HIGH => Self::HalfDoubleHigh,
            IMM_0 => Self::Imm0,
            IMM_1 => Self::Imm1,
            IMM_1_INT => Self::Imm1Int,
            IMM_M1_INT => Self::ImmM1Int,
            IMM_0_5 => Self::Imm05,
            LITERAL => Self::Literal,
            PV => Self::PrevVector,
            PS => Self::PrevScalar,
            CFILE..=511 => Self::ConstFile(sel - CFILE),
            _ => Self::Reserved(sel),
        }
    }

    pub const fn sel(self) -> u32 {
        use alu_src::*;
        match self {
            Self::Gpr(index) => index,
            Self::Kcache0(index) => KCACHE_BANK0 + index,
            Self::Kcache1(index) => KCACHE_BANK1 + index,
            Self::ConstFile(index) => CFILE + index,
            Self::OneDoubleLow => ONE_DOUBLE_LOW,
            Self::OneDoubleHigh => ONE_DOUBLE_HIGH,
            Self::HalfDoubleLow => HALF_DOUBLE_LOW,
            Self::HalfDoubleHigh => HALF_DOUBLE_HIGH,
            Self::Imm0 => IMM_0,
            Self::Imm1 => IMM_1,
            Self::Imm1Int => IMM_1_INT,
            Self::ImmM1Int => IMM_M1_INT,
            Self::Imm05 => IMM_0_5,
            Self::Literal => LITERAL,
            Self::PrevVector => PV,
            Self::PrevScalar => PS,
            Self::Reserved(sel) => sel,
        }
    }
}
