//! Constituency trees and the features the syntactic metrics read off them.

pub mod features;
pub mod parse_cache;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub use features::{SyntacticAnalyzer, SyntacticFeatures};
pub use parse_cache::{CachedParser, ParseCache, Parser};

/// A node of a bracketed (Penn Treebank) tree. Leaves carry the word as
/// their label and have no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    label: String,
    children: Vec<Tree>,
}

impl Tree {
    pub fn leaf<S: Into<String>>(word: S) -> Tree {
        Tree {
            label: word.into(),
            children: Vec::new(),
        }
    }

    pub fn node<S: Into<String>>(label: S, children: Vec<Tree>) -> Tree {
        Tree {
            label: label.into(),
            children,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A tag node directly above a word, e.g. `(DT the)`.
    pub fn is_preterminal(&self) -> bool {
        !self.children.is_empty() && self.children.iter().all(Tree::is_leaf)
    }

    pub fn is_phrasal(&self) -> bool {
        !self.is_leaf() && !self.is_preterminal()
    }

    /// Edges on the longest path down to a leaf; a leaf has height 0.
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Every node, preorder, including this one and the leaves.
    pub fn subtrees(&self) -> Vec<&Tree> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(t) = stack.pop() {
            out.push(t);
            stack.extend(t.children.iter().rev());
        }
        out
    }

    pub fn leaves(&self) -> Vec<&str> {
        self.leaf_depths().into_iter().map(|(w, _)| w).collect()
    }

    /// Leaves left to right with their distance from this node.
    pub fn leaf_depths(&self) -> Vec<(&str, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(self, 0)];
        while let Some((t, depth)) = stack.pop() {
            if t.is_leaf() {
                out.push((t.label.as_str(), depth));
                continue;
            }
            stack.extend(t.children.iter().rev().map(|c| (c, depth + 1)));
        }
        out
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            return write!(f, "{}", self.label);
        }
        write!(f, "(")?;
        if !self.label.is_empty() {
            write!(f, "{}", self.label)?;
        }
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 || !self.label.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Atom(&'a str),
}

fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(st) = start.take() {
                tokens.push(Token::Atom(&s[st..i]));
            }
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        tokens.push(Token::Atom(&s[st..]));
    }
    tokens
}

fn parse_node<'a>(tokens: &[Token<'a>], pos: &mut usize) -> Result<Tree> {
    match tokens.get(*pos) {
        Some(Token::Atom(word)) => {
            *pos += 1;
            Ok(Tree::leaf(*word))
        }
        Some(Token::Open) => {
            *pos += 1;
            let label = match tokens.get(*pos) {
                Some(Token::Atom(l)) => {
                    *pos += 1;
                    l.to_string()
                }
                _ => String::new(),
            };
            let mut children = Vec::new();
            loop {
                match tokens.get(*pos) {
                    Some(Token::Close) => {
                        *pos += 1;
                        return Ok(Tree::node(label, children));
                    }
                    Some(_) => children.push(parse_node(tokens, pos)?),
                    None => return Err(Error::Tree(format!("unclosed bracket under {label:?}"))),
                }
            }
        }
        Some(Token::Close) => Err(Error::Tree("unexpected ')'".to_string())),
        None => Err(Error::Tree("empty tree".to_string())),
    }
}

impl FromStr for Tree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Tree> {
        let tokens = tokenize(s);
        let mut pos = 0;
        let tree = parse_node(&tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(Error::Tree(format!("trailing input after tree in {s:?}")));
        }
        Ok(tree)
    }
}
