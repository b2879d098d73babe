//! A parser for the DIMACS WCNF file format. Given that WCNF files can be very large, the
//! implementation reads the file in chunks and reuses its buffers rather than allocating for
//! every clause.
//!
//! The parser operates on a type which implements [`DimacsSink`], the interface between the
//! parser and the consumer of the parsed clauses. A header of the form
//! `p wcnf <variables> <clauses> [<top>]` has to precede the clauses; every clause line starts
//! with its weight, and a weight of at least `top` marks a hard clause.
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::num::NonZeroI32;
use std::str::FromStr;

use thiserror::Error;

/// Collects the clauses read from a WCNF source.
pub trait DimacsSink {
    /// The arguments to the dimacs sink.
    type ConstructorArgs;

    /// The underlying formula type.
    type Formula;

    /// Create an empty formula over the variables `1..=num_variables`.
    fn empty(args: Self::ConstructorArgs, num_variables: usize) -> Self;

    fn add_hard_clause(&mut self, clause: &[NonZeroI32]);

    /// Add a soft clause with a positive weight.
    fn add_soft_clause(&mut self, clause: &[NonZeroI32], weight: u64);

    /// Take the collected clauses and turn them into the underlying formula type.
    fn into_formula(self) -> Self::Formula;
}

#[derive(Debug, Error)]
pub enum DimacsParseError {
    #[error("failed to read file")]
    Io(#[from] std::io::Error),

    #[error("missing dimacs header")]
    MissingHeader,

    #[error("'{0}' is an invalid header")]
    InvalidHeader(String),

    #[error("multiple dimacs headers found")]
    DuplicateHeader,

    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("'{0}' is an invalid DIMACS literal")]
    InvalidLiteral(String),

    #[error("'{0}' is an invalid clause weight")]
    InvalidWeight(String),

    #[error("the total weight of the soft clauses exceeds {}", u64::MAX)]
    SoftWeightOverflow,

    #[error("literal {literal} refers to a variable outside of the declared {num_variables} variables")]
    VariableOutOfRange { literal: i32, num_variables: usize },

    #[error("the last clause in the source is not terminated with a '0'")]
    UnterminatedClause,

    #[error("expected to parse {expected} clauses, but parsed {parsed}")]
    IncorrectClauseCount { expected: usize, parsed: usize },
}

pub fn parse_wcnf<Sink: DimacsSink>(
    source: impl Read,
    sink_constructor_args: Sink::ConstructorArgs,
) -> Result<Sink::Formula, DimacsParseError> {
    let mut reader = BufReader::new(source);
    let mut parser = DimacsParser::<Sink>::new(sink_constructor_args);

    loop {
        let num_bytes = {
            let data = reader.fill_buf()?;

            if data.is_empty() {
                return parser.complete();
            }

            parser.parse_chunk(data)?;
            data.len()
        };

        reader.consume(num_bytes);
    }
}

struct DimacsParser<Sink: DimacsSink> {
    sink_constructor_args: Option<Sink::ConstructorArgs>,
    sink: Option<Sink>,
    header: Option<WcnfHeader>,
    buffer: String,
    weight: Option<u64>,
    clause: Vec<NonZeroI32>,
    state: ParseState,
    parsed_clauses: usize,
    total_soft_weight: u64,
}

enum ParseState {
    StartLine,
    Header,
    Comment,
    Weight,
    Literal,
    NegativeLiteral,
    Clause,
}

impl<Sink: DimacsSink> DimacsParser<Sink> {
    fn new(sink_constructor_args: Sink::ConstructorArgs) -> Self {
        DimacsParser {
            sink_constructor_args: Some(sink_constructor_args),
            sink: None,
            header: None,
            buffer: String::new(),
            weight: None,
            clause: vec![],
            state: ParseState::StartLine,
            parsed_clauses: 0,
            total_soft_weight: 0,
        }
    }

    /// Parse the next chunk of bytes. This may start in the middle of parsing a clause or file
    /// header, and may end in such a state as well.
    fn parse_chunk(&mut self, chunk: &[u8]) -> Result<(), DimacsParseError> {
        for byte in chunk {
            match self.state {
                ParseState::StartLine => match byte {
                    b if b.is_ascii_whitespace() => {}

                    b'p' if self.weight.is_none() => {
                        self.state = ParseState::Header;
                        self.buffer.clear();
                        self.buffer.push('p');
                    }

                    b'c' => self.state = ParseState::Comment,

                    b => self.start_token(*b)?,
                },

                ParseState::Header => match byte {
                    b'\n' => {
                        self.init_formula()?;
                        self.state = ParseState::StartLine;
                    }

                    b => self.buffer.push(*b as char),
                },

                ParseState::Comment => {
                    if *byte == b'\n' {
                        self.state = ParseState::StartLine;
                    }
                }

                ParseState::Weight => match byte {
                    b if b.is_ascii_whitespace() => self.finish_weight()?,

                    b @ b'0'..=b'9' => self.buffer.push(*b as char),

                    b => return Err(DimacsParseError::UnexpectedCharacter(*b as char)),
                },

                ParseState::Literal => match byte {
                    b if b.is_ascii_whitespace() => self.finish_literal()?,

                    b @ b'0'..=b'9' => self.buffer.push(*b as char),

                    b => return Err(DimacsParseError::UnexpectedCharacter(*b as char)),
                },

                ParseState::NegativeLiteral => match byte {
                    b @ b'1'..=b'9' => {
                        self.buffer.push(*b as char);
                        self.state = ParseState::Literal;
                    }

                    b => return Err(DimacsParseError::UnexpectedCharacter(*b as char)),
                },

                ParseState::Clause => match byte {
                    // A new-line does not terminate the clause; the clause which is being parsed
                    // is kept and continues with the next literal.
                    b'\n' => self.state = ParseState::StartLine,
                    b if b.is_ascii_whitespace() => {}

                    b => self.start_token(*b)?,
                },
            }
        }

        Ok(())
    }

    /// Starts reading a weight (at the start of a clause) or a literal, or terminates the clause
    /// on a `0`.
    fn start_token(&mut self, byte: u8) -> Result<(), DimacsParseError> {
        self.buffer.clear();
        self.buffer.push(byte as char);

        match byte {
            b'0'..=b'9' if self.weight.is_none() => self.state = ParseState::Weight,
            b'0' => self.finish_clause()?,
            b'1'..=b'9' => self.state = ParseState::Literal,
            b'-' if self.weight.is_some() => self.state = ParseState::NegativeLiteral,
            b => return Err(DimacsParseError::UnexpectedCharacter(b as char)),
        }

        Ok(())
    }

    fn complete(mut self) -> Result<Sink::Formula, DimacsParseError> {
        // A source may end without a final new-line.
        match self.state {
            ParseState::Weight => self.finish_weight()?,
            ParseState::Literal => self.finish_literal()?,
            ParseState::Header => {
                self.init_formula()?;
            }
            _ => {}
        }

        let sink = self.sink.ok_or(DimacsParseError::MissingHeader)?;
        let Some(header) = self.header else {
            return Err(DimacsParseError::MissingHeader);
        };

        if self.weight.is_some() || !self.clause.is_empty() {
            Err(DimacsParseError::UnterminatedClause)
        } else if header.num_clauses != self.parsed_clauses {
            Err(DimacsParseError::IncorrectClauseCount {
                expected: header.num_clauses,
                parsed: self.parsed_clauses,
            })
        } else {
            Ok(sink.into_formula())
        }
    }

    fn init_formula(&mut self) -> Result<(), DimacsParseError> {
        let header = self.buffer.trim().parse::<WcnfHeader>()?;

        self.sink = Some(Sink::empty(
            self.sink_constructor_args
                .take()
                .ok_or(DimacsParseError::DuplicateHeader)?,
            header.num_variables,
        ));
        self.header = Some(header);

        Ok(())
    }

    fn finish_weight(&mut self) -> Result<(), DimacsParseError> {
        let weight = self
            .buffer
            .parse::<u64>()
            .ok()
            .filter(|&weight| weight > 0)
            .ok_or_else(|| DimacsParseError::InvalidWeight(self.buffer.clone()))?;

        self.weight = Some(weight);
        self.state = ParseState::Clause;
        Ok(())
    }

    fn finish_literal(&mut self) -> Result<(), DimacsParseError> {
        let header = self.header.as_ref().ok_or(DimacsParseError::MissingHeader)?;
        let literal = self
            .buffer
            .parse::<i32>()
            .ok()
            .and_then(NonZeroI32::new)
            .ok_or_else(|| DimacsParseError::InvalidLiteral(self.buffer.clone()))?;

        if literal.unsigned_abs().get() as usize > header.num_variables {
            return Err(DimacsParseError::VariableOutOfRange {
                literal: literal.get(),
                num_variables: header.num_variables,
            });
        }

        self.clause.push(literal);
        self.state = ParseState::Clause;
        Ok(())
    }

    fn finish_clause(&mut self) -> Result<(), DimacsParseError> {
        let sink = self.sink.as_mut().ok_or(DimacsParseError::MissingHeader)?;
        let header = self.header.as_ref().ok_or(DimacsParseError::MissingHeader)?;
        let weight = self
            .weight
            .take()
            .ok_or(DimacsParseError::UnexpectedCharacter('0'))?;

        if header.top_weight.is_some_and(|top| weight >= top) {
            sink.add_hard_clause(&self.clause);
        } else {
            self.total_soft_weight = self
                .total_soft_weight
                .checked_add(weight)
                .ok_or(DimacsParseError::SoftWeightOverflow)?;
            sink.add_soft_clause(&self.clause, weight);
        }

        self.parsed_clauses += 1;
        self.clause.clear();
        self.state = ParseState::Clause;
        Ok(())
    }
}

/// The `p wcnf` header; without a `top` weight every clause is soft.
#[derive(Debug)]
struct WcnfHeader {
    num_variables: usize,
    num_clauses: usize,
    top_weight: Option<u64>,
}

impl FromStr for WcnfHeader {
    type Err = DimacsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid_header = || DimacsParseError::InvalidHeader(s.to_owned());

        let mut components = s.split_whitespace();
        if components.next() != Some("p") || components.next() != Some("wcnf") {
            return Err(invalid_header());
        }

        let num_variables = next_header_component::<usize>(&mut components, s)?;
        let num_clauses = next_header_component::<usize>(&mut components, s)?;
        let top_weight = components
            .next()
            .map(|top| top.parse::<u64>().map_err(|_| invalid_header()))
            .transpose()?;

        if components.next().is_some() {
            return Err(invalid_header());
        }

        Ok(Self {
            num_variables,
            num_clauses,
            top_weight,
        })
    }
}

fn next_header_component<'a, Num: FromStr>(
    components: &mut impl Iterator<Item = &'a str>,
    header: &str,
) -> Result<Num, DimacsParseError> {
    components
        .next()
        .ok_or_else(|| DimacsParseError::InvalidHeader(header.to_owned()))?
        .parse::<Num>()
        .map_err(|_| DimacsParseError::InvalidHeader(header.to_owned()))
}
