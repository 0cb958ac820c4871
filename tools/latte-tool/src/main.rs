#![forbid(unsafe_code)]

// Native-only tool; the stub keeps `--target wasm32-unknown-unknown --workspace` builds working.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::main();
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, bail, Context, Result};
    use clap::{Parser, Subcommand, ValueEnum};
    use latte_assembler::ast::Comment;
    use latte_assembler::gfd::{PixelShaderHeader, VertexShaderHeader};
    use latte_assembler::{
        parse_pixel_shader_comments, parse_vertex_shader_comments, CompiledProgram, GfdFile,
        PixelShader, VertexShader,
    };
    use latte_glsl::{ShaderDescriptor, ShaderStage};
    use tracing_subscriber::EnvFilter;

    #[derive(Debug, Parser)]
    #[command(
        name = "latte-assembler",
        about = "Assemble, disassemble and decompile Latte GPU shaders"
    )]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Assemble vertex and pixel shaders into a GFD container.
        Assemble {
            /// Vertex shader assembly source. May be repeated.
            #[arg(long, value_name = "FILE")]
            vsh: Vec<PathBuf>,

            /// Pixel shader assembly source. May be repeated.
            #[arg(long, value_name = "FILE")]
            psh: Vec<PathBuf>,

            /// Start every program block on a 0x200 byte boundary.
            #[arg(long)]
            align: bool,

            /// Destination .gsh file.
            output: PathBuf,
        },

        /// Print the assembly text of a raw shader binary.
        Disassemble {
            /// Control flow program followed by its clauses, little-endian.
            binary: PathBuf,
        },

        /// Translate a shader to GLSL and print it.
        Glsl {
            #[arg(long, value_enum)]
            stage: Stage,

            /// Read constant-buffer operands from uniform blocks.
            #[arg(long)]
            uniform_blocks: bool,

            /// Read constant-file operands from a uniform register array.
            #[arg(long)]
            uniform_registers: bool,

            /// Treat the input as a raw binary instead of assembly source.
            #[arg(long)]
            binary: bool,

            input: PathBuf,
        },
    }

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum Stage {
        Vertex,
        Pixel,
        Geometry,
    }

    impl From<Stage> for ShaderStage {
        fn from(stage: Stage) -> Self {
            match stage {
                Stage::Vertex => ShaderStage::Vertex,
                Stage::Pixel => ShaderStage::Pixel,
                Stage::Geometry => ShaderStage::Geometry,
            }
        }
    }

    pub fn main() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();

        if let Err(err) = run(Cli::parse()) {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }

    fn run(cli: Cli) -> Result<()> {
        match cli.command {
            Command::Assemble {
                vsh,
                psh,
                align,
                output,
            } => assemble(&vsh, &psh, align, &output),
            Command::Disassemble { binary } => {
                let bytes = fs::read(&binary)
                    .with_context(|| format!("failed to read {}", binary.display()))?;
                let text = latte_isa::disassemble(&bytes)
                    .map_err(|err| anyhow!("{}: {err}", binary.display()))?;
                print!("{text}");
                Ok(())
            }
            Command::Glsl {
                stage,
                uniform_blocks,
                uniform_registers,
                binary,
                input,
            } => {
                let bytes = if binary {
                    fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?
                } else {
                    compile_file(&input)?.to_binary()
                };

                let desc = ShaderDescriptor::new(stage.into())
                    .with_uniform_blocks(uniform_blocks)
                    .with_uniform_registers(uniform_registers);
                let shader = latte_glsl::translate(&desc, &bytes).map_err(|err| {
                    anyhow!(
                        "{}: {} (control flow instruction {})\n{}",
                        input.display(),
                        err.kind,
                        err.cf_pc,
                        err.disassembly
                    )
                })?;
                print!("{}", shader.to_glsl());
                Ok(())
            }
        }
    }

    fn assemble(vsh: &[PathBuf], psh: &[PathBuf], align: bool, output: &Path) -> Result<()> {
        if vsh.is_empty() && psh.is_empty() {
            bail!("nothing to assemble: pass at least one --vsh or --psh file");
        }

        let mut gfd = GfdFile::default();
        for path in vsh {
            let program = compile_file(path)?;
            let mut header = VertexShaderHeader::default();
            apply_comments(path, &program.comments, |text| {
                parse_vertex_shader_comments(&mut header, [text])
            })?;
            gfd.vertex_shaders.push(VertexShader {
                header,
                program: program.to_binary(),
            });
        }
        for path in psh {
            let program = compile_file(path)?;
            let mut header = PixelShaderHeader::default();
            apply_comments(path, &program.comments, |text| {
                parse_pixel_shader_comments(&mut header, [text])
            })?;
            gfd.pixel_shaders.push(PixelShader {
                header,
                program: program.to_binary(),
            });
        }

        let bytes = gfd
            .to_bytes(align)
            .context("failed to build GFD container")?;
        fs::write(output, &bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::info!(
            output = %output.display(),
            vertex_shaders = vsh.len(),
            pixel_shaders = psh.len(),
            bytes = bytes.len(),
            "wrote shader container"
        );
        Ok(())
    }

    fn compile_file(path: &Path) -> Result<CompiledProgram> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        latte_assembler::compile(&source).map_err(|err| anyhow!("{}:{err}", path.display()))
    }

    /// Feeds comments to a header parser one at a time so failures point at their line.
    fn apply_comments<E: std::fmt::Display>(
        path: &Path,
        comments: &[Comment],
        mut apply: impl FnMut(&str) -> std::result::Result<(), E>,
    ) -> Result<()> {
        for comment in comments {
            apply(&comment.text)
                .map_err(|err| anyhow!("{}:{}: {err}", path.display(), comment.location))?;
        }
        Ok(())
    }
}
