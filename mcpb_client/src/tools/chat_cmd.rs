// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, fmt::Display, future::Future, sync::Arc, time::Duration};

use futures::{future::BoxFuture, FutureExt};
use mcpb_core::text;
use thiserror::Error;

use crate::{player::Player, Minecraft};

const HELP_DOC: &str = "List available commands with 'help' or detailed help with 'help cmd'";
const HELP_INTRO: &str = "All commands:";
const HELP_DOCUMENTED: &str = "Documented commands (help <command>):";
const HELP_UNDOCUMENTED: &str = "Undocumented commands:";
const HELP_RULER: &str = "=";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("No closing quotation")]
    UnterminatedQuote,
    #[error("No escaped character")]
    TrailingEscape,
}

/// Splits a command line into words the way a POSIX shell would: whitespace separates words,
/// quotes group them and backslashes escape outside single quotes.
pub fn split_args(line: &str) -> Result<Vec<String>, SplitError> {
    let mut words = vec![];
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(SplitError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(SplitError::UnterminatedQuote),
                        },
                        Some(c) => current.push(c),
                        None => return Err(SplitError::UnterminatedQuote),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(SplitError::TrailingEscape),
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Lays `items` out in as few rows as fit into `display_width` characters, filling columns
/// top to bottom.
pub fn columnize(items: &[String], display_width: usize) -> Vec<String> {
    let size = items.len();
    match size {
        0 => return vec!["<no commands>".to_string()],
        1 => return vec![items[0].clone()],
        _ => {}
    }
    let mut layout = None;
    for nrows in 1..size {
        let ncols = size.div_ceil(nrows);
        let mut widths = Vec::with_capacity(ncols);
        let mut total = -2isize;
        for col in 0..ncols {
            let width = (0..nrows)
                .map(|row| row + nrows * col)
                .take_while(|i| *i < size)
                .map(|i| items[i].chars().count())
                .max()
                .unwrap_or(0);
            widths.push(width);
            total += width as isize + 2;
            if total > display_width as isize {
                break;
            }
        }
        if total <= display_width as isize {
            layout = Some((nrows, ncols, widths));
            break;
        }
    }
    let (nrows, ncols, widths) = layout.unwrap_or((size, 1, vec![0]));

    (0..nrows)
        .map(|row| {
            let mut texts: Vec<&str> = (0..ncols)
                .map(|col| items.get(row + nrows * col).map_or("", String::as_str))
                .collect();
            while texts.last().is_some_and(|t| t.is_empty()) {
                texts.pop();
            }
            texts
                .iter()
                .zip(&widths)
                .map(|(text, width)| format!("{:<width$}", text, width = width))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect()
}

/// A command argument. Numbers are recognized unless disabled with
/// [ChatCommands::parse_numbers].
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Arg {
    pub fn parse(word: &str) -> Arg {
        if let Ok(i) = word.parse() {
            Arg::Int(i)
        } else if let Ok(f) = word.parse() {
            Arg::Float(f)
        } else {
            Arg::Str(word.to_string())
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Arg::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Int(i) => Some(*i as f64),
            Arg::Float(f) => Some(*f),
            Arg::Str(_) => None,
        }
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Int(i) => write!(f, "{}", i),
            Arg::Float(x) => write!(f, "{}", x),
            Arg::Str(s) => f.write_str(s),
        }
    }
}

/// Whether [ChatCommands::run_loop] keeps going after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

type Handler =
    Arc<dyn Fn(Minecraft, Player, Vec<Arg>) -> BoxFuture<'static, anyhow::Result<Flow>> + Send + Sync>;

struct Command {
    doc: Option<String>,
    handler: Handler,
}

/// Turns chat messages like `!build 10 stone` into calls of registered handlers.
///
/// `help` is built in and lists all commands, or shows a command's documentation with
/// `help <command>`.
pub struct ChatCommands {
    mc: Minecraft,
    commands: BTreeMap<String, Command>,
    prefix: String,
    wait: Duration,
    parse_numbers: bool,
    catch_errors: bool,
}

impl ChatCommands {
    pub fn new(mc: Minecraft) -> Self {
        Self {
            mc,
            commands: BTreeMap::new(),
            prefix: "!".to_string(),
            wait: Duration::from_millis(100),
            parse_numbers: true,
            catch_errors: true,
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Pause between two polls of the chat.
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn parse_numbers(mut self, parse_numbers: bool) -> Self {
        self.parse_numbers = parse_numbers;
        self
    }

    /// With this on, a failing handler is logged and reported in chat instead of ending
    /// [ChatCommands::run_loop].
    pub fn catch_errors(mut self, catch_errors: bool) -> Self {
        self.catch_errors = catch_errors;
        self
    }

    pub fn command<F, Fut>(mut self, name: &str, doc: Option<&str>, handler: F) -> Self
    where
        F: Fn(Minecraft, Player, Vec<Arg>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Flow>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |mc, player, args| handler(mc, player, args).boxed());
        self.commands.insert(
            name.to_string(),
            Command {
                doc: doc.map(str::to_string),
                handler,
            },
        );
        self
    }

    async fn say(&self, message: impl Display) -> anyhow::Result<()> {
        self.mc.post_to_chat(message).await?;
        Ok(())
    }

    /// Handles one chat message. Messages without the prefix are ignored.
    pub async fn handle_message(&self, player: &Player, message: &str) -> anyhow::Result<Flow> {
        let message = message.trim_end_matches(['\r', '\n']);
        let Some(line) = message.strip_prefix(self.prefix.as_str()) else {
            return Ok(Flow::Continue);
        };
        let words = match split_args(line.trim()) {
            Ok(words) => words,
            Err(e) => {
                log::warn!("Couldn't parse command {:?}: {}", line, e);
                self.say(format!("{}{}", text::RED, e)).await?;
                return Ok(Flow::Continue);
            }
        };
        let Some((name, rest)) = words.split_first() else {
            return Ok(Flow::Continue);
        };

        let Some(command) = self.commands.get(name) else {
            if name == "help" {
                self.help(rest.first().map(String::as_str)).await?;
            } else {
                self.say(format!("{}No such command: {}{}", text::RED, text::GOLD, name))
                    .await?;
            }
            return Ok(Flow::Continue);
        };

        let args = rest
            .iter()
            .map(|word| {
                if self.parse_numbers {
                    Arg::parse(word)
                } else {
                    Arg::Str(word.clone())
                }
            })
            .collect();
        log::debug!("{:?} runs {} {:?}", player, name, args);
        match (command.handler)(self.mc.clone(), player.clone(), args).await {
            Ok(flow) => Ok(flow),
            Err(e) if self.catch_errors => {
                log::error!("Command {} failed: {:?}", name, e);
                self.say(format!("{}The command didn't work!", text::RED))
                    .await?;
                Ok(Flow::Continue)
            }
            Err(e) => Err(e),
        }
    }

    async fn help(&self, topic: Option<&str>) -> anyhow::Result<()> {
        let name_style = format!("{}{}", text::GOLD, text::BOLD);
        if let Some(topic) = topic {
            let doc = match self.commands.get(topic) {
                Some(command) => command.doc.clone(),
                None if topic == "help" => Some(HELP_DOC.to_string()),
                None => None,
            };
            return match doc.filter(|d| !d.trim().is_empty()) {
                Some(doc) => {
                    let doc = doc.lines().map(str::trim).collect::<Vec<_>>().join(" ");
                    self.say(format!(
                        "{}{}: {}{}{}",
                        name_style,
                        topic,
                        text::RESET,
                        text::GRAY,
                        doc
                    ))
                    .await
                }
                None => {
                    self.say(format!("{}No help for command: {}{}", text::RED, text::GOLD, topic))
                        .await
                }
            };
        }

        let mut documented = vec![];
        let mut undocumented = vec![];
        if !self.commands.contains_key("help") {
            documented.push("help".to_string());
        }
        for (name, command) in &self.commands {
            if command.doc.is_some() {
                documented.push(name.clone());
            } else {
                undocumented.push(name.clone());
            }
        }
        documented.sort();
        let width = HELP_DOCUMENTED.len().max(HELP_UNDOCUMENTED.len()) - 1;
        self.say(HELP_INTRO).await?;
        for (header, names) in [(HELP_DOCUMENTED, documented), (HELP_UNDOCUMENTED, undocumented)] {
            if names.is_empty() {
                continue;
            }
            self.say(header).await?;
            self.say(HELP_RULER.repeat(header.len())).await?;
            for line in columnize(&names, width) {
                self.say(format!("{}{}", name_style, line)).await?;
            }
        }
        Ok(())
    }

    /// Polls the chat and runs commands until one returns [Flow::Stop].
    pub async fn run_loop(&self, intro: Option<&str>) -> anyhow::Result<()> {
        if let Some(intro) = intro {
            self.say(intro).await?;
        }
        loop {
            for event in self.mc.poll_chat_events().await? {
                if self.handle_message(&event.player, &event.message).await? == Flow::Stop {
                    return Ok(());
                }
            }
            tokio::time::sleep(self.wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("build 10  stone").unwrap(), strings(&["build", "10", "stone"]));
        assert_eq!(
            split_args("say \"hello world\" 'it''s' a\\ b").unwrap(),
            strings(&["say", "hello world", "its", "a b"])
        );
        assert_eq!(split_args("x \"\" y").unwrap(), strings(&["x", "", "y"]));
        assert_eq!(split_args("   ").unwrap(), Vec::<String>::new());
        assert_eq!(
            split_args("say \"oops"),
            Err(SplitError::UnterminatedQuote)
        );
        assert_eq!(split_args("trailing\\"), Err(SplitError::TrailingEscape));
    }

    #[test]
    fn test_arg_parsing() {
        assert_eq!(Arg::parse("42"), Arg::Int(42));
        assert_eq!(Arg::parse("-3"), Arg::Int(-3));
        assert_eq!(Arg::parse("2.5"), Arg::Float(2.5));
        assert_eq!(Arg::parse("stone"), Arg::Str("stone".to_string()));
        assert_eq!(Arg::Int(4).as_f64(), Some(4.0));
        assert_eq!(Arg::Float(4.5).as_i64(), None);
        assert_eq!(Arg::Str("x".to_string()).to_string(), "x");
    }

    #[test]
    fn test_columnize() {
        let items = strings(&["a", "bb", "ccc"]);
        assert_eq!(columnize(&items, 80), vec!["a  bb  ccc"]);
        assert_eq!(columnize(&items, 7), vec!["a   ccc", "bb"]);
        assert_eq!(columnize(&items, 5), vec!["a", "bb", "ccc"]);
        assert_eq!(columnize(&[], 80), vec!["<no commands>"]);
        assert_eq!(columnize(&strings(&["only"]), 1), vec!["only"]);
    }
}
