//! Reader for the textual system specification.
//!
//! The format is a single S-expression:
//!
//! ```text
//! (system <n_bits> <init> <trans> (properties <ctl> ...) [(<fair> ...)])
//! ```
//!
//! with `;` line comments. State predicates are built from `true`, `false`,
//! `(var <i>)` and n-ary `and`/`or`/`xor` plus unary `not`; transition
//! expressions use `(var from <i>)` / `(var to <i>)` for the source and
//! target copies of a bit; CTL formulas add the temporal operators.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::bdd::Bdd;
use crate::ctl::CtlFormula;
use crate::error::Error;
use crate::predicate::Predicate;
use crate::space::{StateSpace, MAX_STATE_BITS};
use crate::transition::Transition;

/// A parsed model: everything the checker needs to run.
#[derive(Debug)]
pub struct SystemSpec {
    pub space: Rc<StateSpace>,
    pub init: Predicate,
    pub transition: Transition,
    pub properties: Vec<CtlFormula>,
}

/// Parse a full specification file into a ready-to-check system.
pub fn parse_system(bdd: &Rc<Bdd>, text: &str) -> Result<SystemSpec, Error> {
    let forms = read_forms(text)?;
    let form = match forms.as_slice() {
        [form] => form,
        [] => return Err(Error::parse("empty specification", "")),
        [_, extra, ..] => return Err(Error::parse("expected a single top-level form", extra)),
    };

    let items = expect_form(form, "system")?;
    if !(5..=6).contains(&items.len()) {
        return Err(Error::parse(
            "expected (system <n_bits> <init> <trans> (properties ...) [<fairness>])",
            form,
        ));
    }

    let n_bits = expect_integer(&items[1])?;
    if n_bits == 0 {
        return Err(Error::parse("state width must be positive", &items[1]));
    }
    if n_bits > MAX_STATE_BITS {
        return Err(Error::Resource {
            requested: n_bits,
            max: MAX_STATE_BITS,
        });
    }
    let space = Rc::new(StateSpace::new(bdd.clone(), n_bits));

    let init = lower_state_pred(&space, &items[2])?;
    let mut transition = lower_transition(&space, &items[3])?;

    let prop_items = expect_form(&items[4], "properties")?;
    let properties = prop_items[1..]
        .iter()
        .map(|item| lower_ctl(n_bits, item))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(fairness) = items.get(5) {
        let Sexp::List(constraints) = fairness else {
            return Err(Error::parse("expected a fairness list", fairness));
        };
        for constraint in constraints {
            transition.add_fairness(lower_state_pred(&space, constraint)?)?;
        }
    }

    debug!(
        "parsed system: {} bits, {} properties, {} fairness constraints",
        n_bits,
        properties.len(),
        transition.fairness().len()
    );
    Ok(SystemSpec {
        space,
        init,
        transition,
        properties,
    })
}

/// Build a state predicate from the initial-predicate grammar.
fn lower_state_pred(space: &Rc<StateSpace>, sexp: &Sexp) -> Result<Predicate, Error> {
    match sexp {
        Sexp::Atom(a) if a == "true" => Ok(Predicate::constant(space, true)),
        Sexp::Atom(a) if a == "false" => Ok(Predicate::constant(space, false)),
        Sexp::Atom(_) => Err(Error::parse("expected a predicate", sexp)),
        Sexp::List(items) => {
            let op = expect_operator(items, sexp)?;
            match op {
                "var" => {
                    expect_arity(items, 2, sexp)?;
                    let bit = expect_bit(&items[1], space.state_bits(), sexp)?;
                    Ok(Predicate::state_bit(space, bit))
                }
                "not" => {
                    expect_arity(items, 2, sexp)?;
                    Ok(lower_state_pred(space, &items[1])?.not())
                }
                "and" | "or" | "xor" => {
                    expect_variadic(items, sexp)?;
                    let mut acc = lower_state_pred(space, &items[1])?;
                    for item in &items[2..] {
                        let rhs = lower_state_pred(space, item)?;
                        acc = match op {
                            "and" => acc.and(&rhs),
                            "or" => acc.or(&rhs),
                            _ => acc.xor(&rhs),
                        }?;
                    }
                    Ok(acc)
                }
                _ => Err(Error::parse(format!("unknown operator `{}`", op), sexp)),
            }
        }
    }
}

/// Build a transition relation from the transition grammar.
fn lower_transition(space: &Rc<StateSpace>, sexp: &Sexp) -> Result<Transition, Error> {
    match sexp {
        Sexp::Atom(a) if a == "true" => Ok(Transition::constant(space, true)),
        Sexp::Atom(a) if a == "false" => Ok(Transition::constant(space, false)),
        Sexp::Atom(_) => Err(Error::parse("expected a transition expression", sexp)),
        Sexp::List(items) => {
            let op = expect_operator(items, sexp)?;
            match op {
                "var" => {
                    expect_arity(items, 3, sexp)?;
                    let of_target = match &items[1] {
                        Sexp::Atom(side) if side == "from" => false,
                        Sexp::Atom(side) if side == "to" => true,
                        _ => {
                            return Err(Error::parse("expected `from` or `to`", sexp));
                        }
                    };
                    let bit = expect_bit(&items[2], space.state_bits(), sexp)?;
                    Ok(Transition::literal(space, bit, of_target))
                }
                "not" => {
                    expect_arity(items, 2, sexp)?;
                    Ok(lower_transition(space, &items[1])?.not())
                }
                "and" | "or" | "xor" => {
                    expect_variadic(items, sexp)?;
                    let mut acc = lower_transition(space, &items[1])?;
                    for item in &items[2..] {
                        let rhs = lower_transition(space, item)?;
                        acc = match op {
                            "and" => acc.and(&rhs),
                            "or" => acc.or(&rhs),
                            _ => acc.xor(&rhs),
                        }?;
                    }
                    Ok(acc)
                }
                _ => Err(Error::parse(format!("unknown operator `{}`", op), sexp)),
            }
        }
    }
}

/// Build a CTL formula; `n_bits` bounds the `(var i)` atoms.
fn lower_ctl(n_bits: usize, sexp: &Sexp) -> Result<CtlFormula, Error> {
    match sexp {
        Sexp::Atom(a) if a == "true" => Ok(CtlFormula::True),
        Sexp::Atom(a) if a == "false" => Ok(CtlFormula::False),
        Sexp::Atom(_) => Err(Error::parse("expected a formula", sexp)),
        Sexp::List(items) => {
            let op = expect_operator(items, sexp)?;
            match op {
                "var" => {
                    expect_arity(items, 2, sexp)?;
                    let bit = expect_bit(&items[1], n_bits, sexp)?;
                    Ok(CtlFormula::Var(bit))
                }
                "not" => {
                    expect_arity(items, 2, sexp)?;
                    Ok(lower_ctl(n_bits, &items[1])?.not())
                }
                "and" | "or" | "xor" => {
                    expect_variadic(items, sexp)?;
                    let mut acc = lower_ctl(n_bits, &items[1])?;
                    for item in &items[2..] {
                        let rhs = lower_ctl(n_bits, item)?;
                        acc = match op {
                            "and" => acc.and(rhs),
                            "or" => acc.or(rhs),
                            _ => acc.xor(rhs),
                        };
                    }
                    Ok(acc)
                }
                "EX" | "EF" | "EG" | "AX" | "AF" | "AG" => {
                    expect_arity(items, 2, sexp)?;
                    let f = lower_ctl(n_bits, &items[1])?;
                    Ok(match op {
                        "EX" => f.ex(),
                        "EF" => f.ef(),
                        "EG" => f.eg(),
                        "AX" => f.ax(),
                        "AF" => f.af(),
                        _ => f.ag(),
                    })
                }
                "EU" | "ER" | "AU" | "AR" => {
                    expect_arity(items, 3, sexp)?;
                    let f = lower_ctl(n_bits, &items[1])?;
                    let g = lower_ctl(n_bits, &items[2])?;
                    Ok(match op {
                        "EU" => f.eu(g),
                        "ER" => f.er(g),
                        "AU" => f.au(g),
                        _ => f.ar(g),
                    })
                }
                _ => Err(Error::parse(format!("unknown operator `{}`", op), sexp)),
            }
        }
    }
}

fn expect_form<'a>(sexp: &'a Sexp, head: &str) -> Result<&'a [Sexp], Error> {
    match sexp {
        Sexp::List(items) if matches!(items.first(), Some(Sexp::Atom(a)) if a == head) => {
            Ok(items)
        }
        _ => Err(Error::parse(format!("expected a ({} ...) form", head), sexp)),
    }
}

fn expect_operator<'a>(items: &'a [Sexp], parent: &Sexp) -> Result<&'a str, Error> {
    match items.first() {
        Some(Sexp::Atom(op)) => Ok(op.as_str()),
        _ => Err(Error::parse("expected an operator", parent)),
    }
}

fn expect_arity(items: &[Sexp], arity: usize, parent: &Sexp) -> Result<(), Error> {
    if items.len() == arity {
        Ok(())
    } else {
        Err(Error::parse(
            format!("expected {} operands, found {}", arity - 1, items.len() - 1),
            parent,
        ))
    }
}

fn expect_variadic(items: &[Sexp], parent: &Sexp) -> Result<(), Error> {
    if items.len() >= 3 {
        Ok(())
    } else {
        Err(Error::parse(
            format!("expected at least 2 operands, found {}", items.len() - 1),
            parent,
        ))
    }
}

fn expect_integer(sexp: &Sexp) -> Result<usize, Error> {
    match sexp {
        Sexp::Atom(a) => a
            .parse()
            .map_err(|_| Error::parse("expected an integer", sexp)),
        Sexp::List(_) => Err(Error::parse("expected an integer", sexp)),
    }
}

fn expect_bit(sexp: &Sexp, n_bits: usize, parent: &Sexp) -> Result<usize, Error> {
    let bit = expect_integer(sexp)?;
    if bit < n_bits {
        Ok(bit)
    } else {
        Err(Error::parse(
            format!("variable index {} out of range for {} state bits", bit, n_bits),
            parent,
        ))
    }
}

/// An S-expression: an atom or a parenthesised list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(a) => write!(f, "{}", a),
            Sexp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            c if c.is_whitespace() => {}
            c => {
                let mut atom = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next == '(' || next == ')' || next == ';' || next.is_whitespace() {
                        break;
                    }
                    atom.push(next);
                    chars.next();
                }
                tokens.push(Token::Atom(atom));
            }
        }
    }
    tokens
}

fn read_forms(text: &str) -> Result<Vec<Sexp>, Error> {
    let tokens = tokenize(text);
    let mut forms = Vec::new();
    let mut pos = 0;
    while pos < tokens.len() {
        forms.push(read_one(&tokens, &mut pos)?);
    }
    Ok(forms)
}

fn read_one(tokens: &[Token], pos: &mut usize) -> Result<Sexp, Error> {
    match tokens.get(*pos) {
        None => Err(Error::parse("unexpected end of input", "")),
        Some(Token::Close) => Err(Error::parse("unbalanced parenthesis", ")")),
        Some(Token::Atom(a)) => {
            *pos += 1;
            Ok(Sexp::Atom(a.clone()))
        }
        Some(Token::Open) => {
            *pos += 1;
            let mut items = Vec::new();
            loop {
                match tokens.get(*pos) {
                    None => {
                        return Err(Error::parse(
                            "unexpected end of input",
                            Sexp::List(items),
                        ))
                    }
                    Some(Token::Close) => {
                        *pos += 1;
                        return Ok(Sexp::List(items));
                    }
                    _ => items.push(read_one(tokens, pos)?),
                }
            }
        }
    }
}
