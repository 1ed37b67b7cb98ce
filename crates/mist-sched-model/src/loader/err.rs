// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::instance::InstanceError;
use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    ParseInt(ParseIntError),
    ParseFloat(ParseFloatError),
    UnexpectedEof,
    MalformedRecord { line: String, expected: &'static str },
    Instance(InstanceError),
}

impl From<ParseIntError> for LoadError {
    fn from(e: ParseIntError) -> Self {
        Self::ParseInt(e)
    }
}

impl From<ParseFloatError> for LoadError {
    fn from(e: ParseFloatError) -> Self {
        Self::ParseFloat(e)
    }
}

impl From<InstanceError> for LoadError {
    fn from(e: InstanceError) -> Self {
        Self::Instance(e)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LoadError::*;
        match self {
            Io { path, source } => write!(f, "could not read {}: {source}", path.display()),
            Json { path, source } => write!(f, "malformed JSON in {}: {source}", path.display()),
            ParseInt(e) => write!(f, "parse-int error: {e}"),
            ParseFloat(e) => write!(f, "parse-float error: {e}"),
            UnexpectedEof => write!(f, "unexpected end of file while parsing instance"),
            MalformedRecord { line, expected } => {
                write!(f, "malformed record {line:?}, expected {expected}")
            }
            Instance(e) => write!(f, "invalid instance: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Json { source, .. } => Some(source),
            LoadError::ParseInt(e) => Some(e),
            LoadError::ParseFloat(e) => Some(e),
            LoadError::Instance(e) => Some(e),
            _ => None,
        }
    }
}
