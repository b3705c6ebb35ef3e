//! Line-oriented annotation session.
//!
//! Parses one command per line and runs it against an
//! [`AnnotationController`], turning results and errors into feedback text.
//! Cursor exhaustion is reported as a state ("finished", "start of
//! sequence") rather than as an error.

use std::fmt::Write as _;
use std::str::FromStr;

use thiserror::Error;

use crate::config::AnnotationMode;
use crate::controller::AnnotationController;
use crate::error::{AnnotateError, Result};
use crate::geometry::Xyxy;
use crate::model::{BboxUpdate, BoundingBox, LabelValue};

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  next                               go to the next image
  prev                               go to the previous image
  skip                               go to the next image without annotations
  label <value>                      store a label and advance (single mode)
  labels <value> [value ...]         store labels and advance (multiple mode)
  add <x1> <y1> <x2> <y2> [class]    add a box
  update <idx> [xyxy=x1,y1,x2,y2] [class=<name>|class=-]
                                     change a box; class=- clears the class
  delete <idx>                       delete a box
  show                               show the current image
  help                               show this help
  quit                               save and exit";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Next image
    Next,
    /// Previous image
    Prev,
    /// Next image without a record
    Skip,
    /// Single-select label
    Label(String),
    /// Multi-select label
    Labels(Vec<String>),
    /// New box
    Add {
        /// Corners
        xyxy: Xyxy,
        /// Optional class
        class_name: Option<String>,
    },
    /// Partial box update
    Update {
        /// Box index
        index: usize,
        /// Fields to change
        update: BboxUpdate,
    },
    /// Box removal
    Delete(usize),
    /// Print the current image
    Show,
    /// Print help
    Help,
    /// Save and exit
    Quit,
}

/// Errors from parsing a command line.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseCommandError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// First word is not a command
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    /// Wrong arguments for a known command
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Argument is not a number
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseCommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        let no_args = |command: Command, usage: &'static str| {
            if args.is_empty() {
                Ok(command)
            } else {
                Err(ParseCommandError::Usage(usage))
            }
        };

        match name {
            "next" | "n" => no_args(Command::Next, "next"),
            "prev" | "p" => no_args(Command::Prev, "prev"),
            "skip" | "s" => no_args(Command::Skip, "skip"),
            "show" => no_args(Command::Show, "show"),
            "help" | "?" => no_args(Command::Help, "help"),
            "quit" | "q" | "exit" => no_args(Command::Quit, "quit"),
            "label" => match args.as_slice() {
                [value] => Ok(Command::Label(value.to_string())),
                _ => Err(ParseCommandError::Usage("label <value>")),
            },
            "labels" => {
                if args.is_empty() {
                    return Err(ParseCommandError::Usage("labels <value> [value ...]"));
                }
                Ok(Command::Labels(args.iter().map(|s| s.to_string()).collect()))
            }
            "add" => {
                const USAGE: &str = "add <x1> <y1> <x2> <y2> [class]";
                if args.len() != 4 && args.len() != 5 {
                    return Err(ParseCommandError::Usage(USAGE));
                }
                let xyxy = parse_xyxy(&args[..4])?;
                Ok(Command::Add {
                    xyxy,
                    class_name: args.get(4).map(|s| s.to_string()),
                })
            }
            "update" => {
                const USAGE: &str = "update <idx> [xyxy=x1,y1,x2,y2] [class=<name>|class=-]";
                let (index, fields) = args.split_first().ok_or(ParseCommandError::Usage(USAGE))?;
                let index = parse_index(index)?;
                let mut update = BboxUpdate::new();
                for field in fields {
                    if let Some(coords) = field.strip_prefix("xyxy=") {
                        let parts: Vec<&str> = coords.split(',').collect();
                        if parts.len() != 4 {
                            return Err(ParseCommandError::Usage(USAGE));
                        }
                        update = update.xyxy(parse_xyxy(&parts)?);
                    } else if let Some(class_name) = field.strip_prefix("class=") {
                        update = match class_name {
                            "-" => update.clear_class_name(),
                            "" => return Err(ParseCommandError::Usage(USAGE)),
                            name => update.class_name(name),
                        };
                    } else {
                        return Err(ParseCommandError::Usage(USAGE));
                    }
                }
                Ok(Command::Update { index, update })
            }
            "delete" | "del" => match args.as_slice() {
                [index] => Ok(Command::Delete(parse_index(index)?)),
                _ => Err(ParseCommandError::Usage("delete <idx>")),
            },
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_index(s: &str) -> std::result::Result<usize, ParseCommandError> {
    s.parse()
        .map_err(|_| ParseCommandError::InvalidNumber(s.to_string()))
}

fn parse_xyxy(parts: &[&str]) -> std::result::Result<Xyxy, ParseCommandError> {
    let mut xyxy = [0.0; 4];
    for (slot, part) in xyxy.iter_mut().zip(parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| ParseCommandError::InvalidNumber(part.to_string()))?;
    }
    Ok(xyxy)
}

/// What the caller should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the feedback and read the next line
    Continue(String),
    /// Save and stop
    Quit,
}

/// An interactive session over one controller.
#[derive(Debug)]
pub struct Session {
    controller: AnnotationController,
    mode: AnnotationMode,
}

impl Session {
    /// Create a session.
    pub fn new(controller: AnnotationController, mode: AnnotationMode) -> Self {
        Self { controller, mode }
    }

    /// The underlying controller.
    pub fn controller(&self) -> &AnnotationController {
        &self.controller
    }

    /// Parse and run one input line.
    pub fn handle_line(&mut self, line: &str) -> Outcome {
        match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(ParseCommandError::Empty) => Outcome::Continue(String::new()),
            Err(e) => Outcome::Continue(format!("error: {}", e)),
        }
    }

    /// Run a command and describe the result.
    pub fn execute(&mut self, command: Command) -> Outcome {
        log::trace!("Executing {:?}", command);
        let result = match command {
            Command::Quit => return Outcome::Quit,
            Command::Help => return Outcome::Continue(HELP.to_string()),
            Command::Show => Ok(()),
            Command::Next => self.controller.next_image(),
            Command::Prev => self.controller.previous_image(),
            Command::Skip => self.controller.skip_to_next_missing_annotation(),
            Command::Label(value) => self
                .require_mode(AnnotationMode::ImageLabels)
                .and_then(|()| self.controller.store_label_single(&value)),
            Command::Labels(values) => self
                .require_mode(AnnotationMode::ImageLabels)
                .and_then(|()| self.controller.store_label_multiple(values.as_slice())),
            Command::Add { xyxy, class_name } => {
                self.require_mode(AnnotationMode::Bboxes).and_then(|()| {
                    let mut bbox = BoundingBox::new(xyxy).with_sorted_corners();
                    bbox.class_name = class_name;
                    self.controller.add_bbox(bbox)
                })
            }
            Command::Update { index, update } => self
                .require_mode(AnnotationMode::Bboxes)
                .and_then(|()| self.controller.update_bbox(index, update).map(|_| ())),
            Command::Delete(index) => self
                .require_mode(AnnotationMode::Bboxes)
                .and_then(|()| self.controller.delete_bbox(index).map(|_| ())),
        };

        Outcome::Continue(match result {
            Ok(()) => self.describe_current(),
            Err(AnnotateError::IndexAboveRange) => {
                format!("finished: no more images\n{}", self.describe_current())
            }
            Err(AnnotateError::IndexBelowRange) => {
                format!("start of sequence\n{}", self.describe_current())
            }
            Err(e) => format!("error: {}", e),
        })
    }

    /// Write everything to storage.
    pub fn finish(&mut self) -> Result<()> {
        self.controller.flush()
    }

    fn require_mode(&self, mode: AnnotationMode) -> Result<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(AnnotateError::config(format!(
                "command needs {:?} mode, session is in {:?} mode",
                mode, self.mode
            )))
        }
    }

    /// Text describing the current image and its annotations.
    pub fn describe_current(&self) -> String {
        let Some(current) = self.controller.current() else {
            return "no images".to_string();
        };

        let mut out = format!(
            "[{}/{}] {} ({}x{})",
            current.index + 1,
            self.controller.image_count(),
            current.image_name,
            current.image.width(),
            current.image.height()
        );
        match &current.label {
            Some(LabelValue::Single(value)) => {
                let _ = write!(out, "\n  label: {}", value);
            }
            Some(LabelValue::Multiple(values)) => {
                let _ = write!(out, "\n  labels: {}", values.join(", "));
            }
            None => {}
        }
        for (i, bbox) in current.bboxes.iter().enumerate() {
            let [x1, y1, x2, y2] = bbox.xyxy;
            let _ = write!(out, "\n  box {}: [{}, {}, {}, {}]", i, x1, y1, x2, y2);
            if let Some(class_name) = &bbox.class_name {
                let _ = write!(out, " {}", class_name);
            }
        }
        out
    }
}
