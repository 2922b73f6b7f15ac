use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{map, map_opt, map_res, opt, recognize, value},
    multi::many0_count,
    sequence::preceded,
    IResult, Parser,
};

use crate::model::{Atom, BondOrder, BondStereo, Chirality, Element};

/// Contents of a `[...]` atom before the symbol is resolved to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketAtom<'a> {
    pub isotope: Option<u16>,
    pub symbol: &'a str,
    pub aromatic: bool,
    pub chirality: Chirality,
    pub hydrogens: u8,
    pub charge: i8,
    pub class: Option<u32>,
}

/// Organic subset atom written without brackets: `Cl`, `Br`, `B C N O P S F I`
/// or aromatic `b c n o p s`, plus the `*` wildcard.
pub fn organic_atom(input: &str) -> IResult<&str, Atom> {
    alt((
        value(Atom::organic(Element::CHLORINE, false), tag("Cl")),
        value(Atom::organic(Element::BROMINE, false), tag("Br")),
        value(Atom::organic(Element::WILDCARD, false), char('*')),
        map_opt(one_of("BCNOPSFI"), |c: char| {
            let mut buf = [0u8; 4];
            Element::from_symbol(c.encode_utf8(&mut buf)).map(|e| Atom::organic(e, false))
        }),
        map_opt(one_of("bcnops"), |c: char| {
            Element::from_symbol(&c.to_ascii_uppercase().to_string())
                .map(|e| Atom::organic(e, true))
        }),
    ))
    .parse(input)
}

/// Element symbol inside brackets: aromatic forms first, then an uppercase
/// letter with an optional lowercase letter.
fn bracket_symbol(input: &str) -> IResult<&str, (&str, bool)> {
    alt((
        map(alt((tag("se"), tag("as"))), |s| (s, true)),
        map(recognize(one_of("bcnops")), |s| (s, true)),
        map(tag("*"), |s| (s, false)),
        map(
            recognize((
                satisfy(|c| c.is_ascii_uppercase()),
                opt(satisfy(|c| c.is_ascii_lowercase())),
            )),
            |s| (s, false),
        ),
    ))
    .parse(input)
}

fn chirality(input: &str) -> IResult<&str, Chirality> {
    map(opt(alt((tag("@@"), tag("@")))), |c| match c {
        Some("@@") => Chirality::Clockwise,
        Some(_) => Chirality::AntiClockwise,
        None => Chirality::None,
    })
    .parse(input)
}

/// `H`, `H2` ... ; absent means zero.
fn hydrogen_count(input: &str) -> IResult<&str, u8> {
    map(
        opt(preceded(
            char('H'),
            opt(map_opt(one_of("0123456789"), |c: char| c.to_digit(10))),
        )),
        |h| match h {
            None => 0,
            Some(None) => 1,
            Some(Some(n)) => n as u8,
        },
    )
    .parse(input)
}

/// `+`, `-`, `+2`, `--` ... ; absent means neutral.
fn charge(input: &str) -> IResult<&str, i8> {
    let (input, sign) = opt(one_of("+-")).parse(input)?;
    let Some(sign) = sign else {
        return Ok((input, 0));
    };
    let unit: i8 = if sign == '+' { 1 } else { -1 };

    let (input, magnitude) = opt(map_res(digit1, |d: &str| d.parse::<i8>())).parse(input)?;
    match magnitude {
        Some(m) => Ok((input, unit * m)),
        None => {
            let (input, repeats) = many0_count(char(sign)).parse(input)?;
            Ok((input, unit * (1 + repeats as i8)))
        }
    }
}

/// Parse a complete bracket atom: `[13CH3+:1]`
pub fn bracket_atom(input: &str) -> IResult<&str, BracketAtom<'_>> {
    let (input, _) = char('[').parse(input)?;
    let (input, isotope) = opt(map_res(digit1, |d: &str| d.parse::<u16>())).parse(input)?;
    let (input, (symbol, aromatic)) = bracket_symbol(input)?;
    let (input, chirality) = chirality(input)?;
    let (input, hydrogens) = hydrogen_count(input)?;
    let (input, charge) = charge(input)?;
    let (input, class) =
        opt(preceded(char(':'), map_res(digit1, |d: &str| d.parse::<u32>()))).parse(input)?;
    let (input, _) = char(']').parse(input)?;

    Ok((
        input,
        BracketAtom {
            isotope,
            symbol,
            aromatic,
            chirality,
            hydrogens,
            charge,
            class,
        },
    ))
}

/// Bond symbol: `- = # $ : / \`
pub fn bond_symbol(input: &str) -> IResult<&str, (BondOrder, BondStereo)> {
    map_opt(one_of("-=#$:/\\"), |c: char| {
        let stereo = match c {
            '/' => BondStereo::Up,
            '\\' => BondStereo::Down,
            _ => BondStereo::None,
        };
        BondOrder::from_symbol(c).map(|order| (order, stereo))
    })
    .parse(input)
}

/// Ring closure label: a single digit or `%` followed by two digits.
pub fn ring_label(input: &str) -> IResult<&str, u32> {
    alt((
        map_res(
            preceded(char('%'), take_while_m_n(2, 2, |c: char| c.is_ascii_digit())),
            |d: &str| d.parse::<u32>(),
        ),
        map_opt(satisfy(|c| c.is_ascii_digit()), |c: char| c.to_digit(10)),
    ))
    .parse(input)
}
