//! Interactive session.
//!
//! Drives a [`Session`] from line commands, the way a user would with the
//! file picker and the drag-and-drop list.

use std::str::FromStr;

use anyhow::{Context, bail};

use crate::cli::ShellArgs;
use crate::directory_sink;
use pdfmill::config::{Config, Mode};
use pdfmill::error::{PdfMillError, Result};
use pdfmill::intake::SelectedFile;
use pdfmill::output::{OutputFormatter, display_collection, display_report, display_steps};
use pdfmill::utils::collect_paths_for_patterns;
use pdfmill::{ItemId, Session};

const HELP: &str = "\
Comandos:
  add <archivo|patrón>...   Añadir archivos a la lista
  ls                        Mostrar la lista
  rm <n|id>                 Quitar un archivo por posición o id
  mv <desde> <hasta>        Mover un archivo (posiciones desde 1)
  clear                     Vaciar la lista
  mode <modo>               Cambiar de modo (merge, split, images-to-pdf)
  steps                     Explicar cómo funciona el modo actual
  run                       Procesar la lista
  help                      Mostrar esta ayuda
  quit                      Salir";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(Vec<String>),
    List,
    Remove(Target),
    Move { from: usize, to: usize },
    Clear,
    Mode(Mode),
    Steps,
    Run,
    Help,
    Quit,
}

/// An item addressed by its 1-based position or by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Position(usize),
    Id(String),
}

fn parse_position(arg: &str) -> anyhow::Result<usize> {
    let position: usize = arg
        .parse()
        .with_context(|| format!("posición no válida: {arg}"))?;
    if position == 0 {
        bail!("las posiciones empiezan en 1");
    }
    Ok(position)
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("línea vacía");
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_lowercase().as_str(), args.as_slice()) {
            ("add", []) => bail!("uso: add <archivo|patrón>..."),
            ("add", patterns) => Self::Add(patterns.iter().map(|p| p.to_string()).collect()),
            ("ls" | "list", []) => Self::List,
            ("rm" | "remove", [target]) => Self::Remove(match target.parse::<usize>() {
                Ok(_) => Target::Position(parse_position(target)?),
                Err(_) => Target::Id(target.to_string()),
            }),
            ("rm" | "remove", _) => bail!("uso: rm <n|id>"),
            ("mv" | "move", [from, to]) => Self::Move {
                from: parse_position(from)?,
                to: parse_position(to)?,
            },
            ("mv" | "move", _) => bail!("uso: mv <desde> <hasta>"),
            ("clear", []) => Self::Clear,
            ("mode", [mode]) => Self::Mode(Mode::from_str(mode)?),
            ("mode", _) => bail!("uso: mode <merge|split|images-to-pdf>"),
            ("steps", []) => Self::Steps,
            ("run", []) => Self::Run,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit" | "q", []) => Self::Quit,
            (other, _) => bail!("comando desconocido: {other} (escribe 'help')"),
        };

        Ok(command)
    }
}

/// Whether the loop keeps going after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

struct Shell {
    session: Session,
    config: Config,
    formatter: OutputFormatter,
}

impl Shell {
    fn new(args: &ShellArgs) -> Result<Self> {
        let mode = args.mode()?;
        let options = args.output.process_options()?;

        let mut config = Config::new(mode, Vec::new());
        config.output_dir = args.output.output_dir.clone();
        config.overwrite_mode = args.output.overwrite_mode();
        config.verbose = args.verbose;
        config.options = options;

        Ok(Self {
            session: Session::new(mode).with_options(options)?,
            formatter: OutputFormatter::from_config(&config),
            config,
        })
    }

    fn position(&self, position: usize) -> anyhow::Result<usize> {
        let len = self.session.items().len();
        if position > len {
            return Err(PdfMillError::InvalidPosition {
                index: position - 1,
                len,
            }
            .into());
        }
        Ok(position - 1)
    }

    async fn execute(&mut self, command: ShellCommand) -> anyhow::Result<Flow> {
        match command {
            ShellCommand::Add(patterns) => {
                let paths = collect_paths_for_patterns(&patterns)?;
                let mut batch = Vec::with_capacity(paths.len());
                for path in &paths {
                    batch.push(SelectedFile::from_path(path).await?);
                }

                let offered = batch.len();
                let added = self.session.select(batch)?;
                self.formatter
                    .success(&format!("{added} de {offered} archivo(s) añadidos"));
            }
            ShellCommand::List => {
                display_collection(&self.formatter, self.session.mode(), self.session.items());
            }
            ShellCommand::Remove(target) => {
                let id = match target {
                    Target::Position(position) => {
                        let index = self.position(position)?;
                        self.session.items()[index].id.clone()
                    }
                    Target::Id(id) => ItemId::from(id.as_str()),
                };
                if self.session.remove(&id)? {
                    self.formatter.success(&format!("Quitado {id}"));
                } else {
                    self.formatter.warning(&format!("No hay ningún archivo con id {id}"));
                }
            }
            ShellCommand::Move { from, to } => {
                let from = self.position(from)?;
                let to = self.position(to)?;
                self.session.begin_drag(from)?;
                if self.session.drop_on(to)? {
                    display_collection(&self.formatter, self.session.mode(), self.session.items());
                }
            }
            ShellCommand::Clear => {
                self.session.clear()?;
                self.formatter.success("Lista vaciada");
            }
            ShellCommand::Mode(mode) => {
                self.session.set_mode(mode)?;
                self.config.mode = mode;
                display_steps(&self.formatter, mode);
            }
            ShellCommand::Steps => display_steps(&self.formatter, self.session.mode()),
            ShellCommand::Run => {
                tokio::fs::create_dir_all(&self.config.output_dir)
                    .await
                    .map_err(|e| PdfMillError::FailedToCreateOutput {
                        path: self.config.output_dir.clone(),
                        source: e,
                    })?;

                let mut sink = directory_sink(&self.config, &self.formatter);
                let report = self.session.process(&mut sink).await?;
                display_report(&self.formatter, &report);
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }
}

/// Read one line from stdin without blocking the runtime.
///
/// Returns `None` at end of input.
async fn read_line() -> Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line)?;
        Ok::<_, std::io::Error>((read > 0).then_some(line))
    })
    .await
    .map_err(|e| PdfMillError::other(format!("stdin reader failed: {e}")))?
    .map_err(|e| PdfMillError::other(format!("Failed to read input: {e}")))
}

/// Run the interactive loop until `quit` or end of input.
pub async fn run(args: ShellArgs) -> Result<()> {
    use std::io::Write;

    let mut shell = Shell::new(&args)?;
    shell
        .formatter
        .section(&format!("{} v{}", pdfmill::NAME, pdfmill::VERSION));
    display_steps(&shell.formatter, shell.session.mode());
    shell.formatter.info("Escribe 'help' para ver los comandos.");

    loop {
        print!("{}> ", shell.session.mode());
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(err) => {
                shell.formatter.error(&format!("{err:#}"));
                continue;
            }
        };

        match shell.execute(command).await {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => shell.formatter.error(&format!("{err:#}")),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn shell(mode: Mode) -> Shell {
        let config = Config::new(mode, Vec::new());
        Shell {
            session: Session::new(mode),
            formatter: OutputFormatter::quiet(),
            config,
        }
    }

    fn pdf_bytes() -> Vec<u8> {
        use lopdf::{Document, Object, dictionary};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[rstest]
    #[case("ls", ShellCommand::List)]
    #[case("  LIST ", ShellCommand::List)]
    #[case("clear", ShellCommand::Clear)]
    #[case("run", ShellCommand::Run)]
    #[case("steps", ShellCommand::Steps)]
    #[case("?", ShellCommand::Help)]
    #[case("exit", ShellCommand::Quit)]
    #[case("mode split", ShellCommand::Mode(Mode::Split))]
    #[case("mv 3 1", ShellCommand::Move { from: 3, to: 1 })]
    #[case("rm 2", ShellCommand::Remove(Target::Position(2)))]
    #[case("rm k3j9x0a1b", ShellCommand::Remove(Target::Id("k3j9x0a1b".to_string())))]
    fn test_parse_commands(#[case] line: &str, #[case] expected: ShellCommand) {
        assert_eq!(line.parse::<ShellCommand>().unwrap(), expected);
    }

    #[test]
    fn test_parse_add_keeps_order() {
        let command: ShellCommand = "add b.pdf a*.pdf".parse().unwrap();
        assert_eq!(
            command,
            ShellCommand::Add(vec!["b.pdf".to_string(), "a*.pdf".to_string()])
        );
    }

    #[rstest]
    #[case("")]
    #[case("add")]
    #[case("mv 1")]
    #[case("mv 0 2")]
    #[case("rm")]
    #[case("mode zip")]
    #[case("frobnicate")]
    fn test_parse_errors(#[case] line: &str) {
        assert!(line.parse::<ShellCommand>().is_err());
    }

    #[tokio::test]
    async fn test_add_move_remove() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["a.pdf", "b.pdf"] {
            std::fs::write(dir.path().join(name), pdf_bytes()).unwrap();
        }

        let mut shell = shell(Mode::Merge);
        let pattern = dir.path().join("*.pdf").to_string_lossy().into_owned();
        shell.execute(ShellCommand::Add(vec![pattern])).await.unwrap();
        assert_eq!(shell.session.items().len(), 2);

        let first = shell.session.items()[0].display_name.clone();
        shell
            .execute(ShellCommand::Move { from: 1, to: 2 })
            .await
            .unwrap();
        assert_eq!(shell.session.items()[1].display_name, first);

        shell
            .execute(ShellCommand::Remove(Target::Position(2)))
            .await
            .unwrap();
        assert_eq!(shell.session.items().len(), 1);
        assert_ne!(shell.session.items()[0].display_name, first);
    }

    #[tokio::test]
    async fn test_position_out_of_range() {
        let mut shell = shell(Mode::Merge);
        let err = shell
            .execute(ShellCommand::Remove(Target::Position(1)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fuera de rango"));
    }

    #[tokio::test]
    async fn test_move_rejected_in_split_mode() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["a.pdf", "b.pdf"] {
            std::fs::write(dir.path().join(name), pdf_bytes()).unwrap();
        }

        let mut shell = shell(Mode::Split);
        let pattern = dir.path().join("*.pdf").to_string_lossy().into_owned();
        shell.execute(ShellCommand::Add(vec![pattern])).await.unwrap();

        let err = shell
            .execute(ShellCommand::Move { from: 1, to: 2 })
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<PdfMillError>().is_some());
    }

    #[tokio::test]
    async fn test_run_writes_into_output_dir() {
        let input = tempfile::TempDir::new().unwrap();
        let output = tempfile::TempDir::new().unwrap();
        std::fs::write(input.path().join("doc.pdf"), pdf_bytes()).unwrap();

        let mut shell = shell(Mode::Split);
        shell.config.output_dir = output.path().join("nested");
        let path = input.path().join("doc.pdf").to_string_lossy().into_owned();
        shell.execute(ShellCommand::Add(vec![path])).await.unwrap();

        shell.execute(ShellCommand::Run).await.unwrap();
        assert!(output.path().join("nested/doc_pagina_1.pdf").exists());
    }

    #[tokio::test]
    async fn test_mode_switch_and_quit() {
        let mut shell = shell(Mode::Merge);
        shell
            .execute(ShellCommand::Mode(Mode::ImagesToPdf))
            .await
            .unwrap();
        assert_eq!(shell.session.mode(), Mode::ImagesToPdf);
        assert_eq!(shell.config.mode, Mode::ImagesToPdf);

        assert_eq!(shell.execute(ShellCommand::Quit).await.unwrap(), Flow::Exit);
    }
}
