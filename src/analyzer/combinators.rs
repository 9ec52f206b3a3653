use super::core::ParseError;
use super::core::ParseResult;
use super::core::Parser;
use std::fmt;
use std::marker::PhantomData;

// Equal: 次の要素が value と一致する場合のみ成功する
#[derive(Clone)]
pub struct Equal<I> {
    value: I,
}

impl<I> Equal<I> {
    pub fn new(value: I) -> Self {
        Self { value }
    }
}

impl<I: Clone + PartialEq + fmt::Display> Parser<I, I> for Equal<I> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<I> {
        match input.get(pos) {
            Some(found) if *found == self.value => Ok((pos + 1, found.clone())),
            Some(found) => Err(ParseError::ParseError {
                message: format!("expected `{}`", self.value),
                found: found.to_string(),
                position: pos,
            }),
            None => Err(ParseError::EOF),
        }
    }
}

#[derive(Clone)]
pub struct Satisfy<I, O, F> {
    f: F,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O, F> Satisfy<I, O, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, F> Parser<I, O> for Satisfy<I, O, F>
where
    F: Fn(&I) -> Option<O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let item = input.get(pos).ok_or(ParseError::EOF)?;
        (self.f)(item)
            .map(|result| (pos + 1, result))
            .ok_or(ParseError::Unexpected(pos))
    }
}

pub struct Choice<I, O> {
    parsers: Vec<Box<dyn Parser<I, O>>>,
}

impl<I, O> Choice<I, O> {
    pub fn new(parsers: Vec<Box<dyn Parser<I, O>>>) -> Self {
        Self { parsers }
    }
}

impl<I, O> Parser<I, O> for Choice<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        for parser in &self.parsers {
            if let Ok(result) = parser.parse(input, pos) {
                return Ok(result);
            }
        }
        if pos >= input.len() {
            Err(ParseError::EOF)
        } else {
            Err(ParseError::NoAlternative)
        }
    }
}

#[derive(Clone)]
pub struct Tuple2<P1, P2> {
    parser1: P1,
    parser2: P2,
}

impl<P1, P2> Tuple2<P1, P2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self { parser1, parser2 }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, (O1, O2)> for Tuple2<P1, P2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        Ok((pos, (result1, result2)))
    }
}

#[derive(Clone)]
pub struct Map<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> Map<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        self.parser
            .parse(input, pos)
            .map(|(pos, value)| (pos, (self.f)(value)))
    }
}

#[derive(Clone)]
pub struct Many<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> Many<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut current_pos = pos;

        while let Ok((new_pos, value)) = self.parser.parse(input, current_pos) {
            if new_pos == current_pos {
                break;
            }
            results.push(value);
            current_pos = new_pos;
        }

        Ok((current_pos, results))
    }
}

// SeparatedList: 空リストを許す。区切りの後に要素が無ければ失敗
pub struct SeparatedList<P, S, SO> {
    item_parser: P,
    separator_parser: S,
    _phantom: PhantomData<SO>,
}

impl<P, S, SO> SeparatedList<P, S, SO> {
    pub fn new(item_parser: P, separator_parser: S) -> Self {
        Self {
            item_parser,
            separator_parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, SO, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, SO>
where
    P: Parser<I, O>,
    S: Parser<I, SO>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();

        let Ok((mut current_pos, first)) = self.item_parser.parse(input, pos) else {
            return Ok((pos, results));
        };
        results.push(first);

        while let Ok((sep_pos, _)) = self.separator_parser.parse(input, current_pos) {
            let (new_pos, value) = self.item_parser.parse(input, sep_pos)?;
            results.push(value);
            current_pos = new_pos;
        }

        Ok((current_pos, results))
    }
}

#[derive(Clone)]
pub struct Delimited<L, P, R, LO, RO> {
    left: L,
    parser: P,
    right: R,
    _phantom: PhantomData<(LO, RO)>,
}

impl<L, P, R, LO, RO> Delimited<L, P, R, LO, RO> {
    pub fn new(left: L, parser: P, right: R) -> Self {
        Self {
            left,
            parser,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, LO, RO, L, P, R> Parser<I, O> for Delimited<L, P, R, LO, RO>
where
    L: Parser<I, LO>,
    P: Parser<I, O>,
    R: Parser<I, RO>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.left.parse(input, pos)?;
        let (pos, value) = self.parser.parse(input, pos)?;
        let (pos, _) = self.right.parse(input, pos)?;
        Ok((pos, value))
    }
}

#[derive(Clone)]
pub struct WithContext<P, C> {
    parser: P,
    context: C,
}

impl<P, C> WithContext<P, C> {
    pub fn new(parser: P, context: C) -> Self {
        Self { parser, context }
    }
}

impl<I, O, P, C: ToString> Parser<I, O> for WithContext<P, C>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser
            .parse(input, pos)
            .map_err(|e| ParseError::WithContext {
                message: self.context.to_string(),
                inner: Box::new(e),
            })
    }
}

// Lazy: 再帰的な文法のために、パース時にパーサーを生成する
#[derive(Clone)]
pub struct Lazy<F> {
    f: F,
}

impl<F> Lazy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (self.f)().parse(input, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit() -> Satisfy<char, u32, impl Fn(&char) -> Option<u32>> {
        Satisfy::new(|c: &char| c.to_digit(10))
    }

    #[test]
    fn test_equal() {
        let input = vec!['a', 'b', 'c'];
        let parser = Equal::new('b');

        assert_eq!(parser.parse(&input, 1), Ok((2, 'b')));
        assert_eq!(
            parser.parse(&input, 0),
            Err(ParseError::ParseError {
                message: "expected `b`".to_string(),
                found: "a".to_string(),
                position: 0,
            })
        );
        assert_eq!(parser.parse(&input, 3), Err(ParseError::EOF));
    }

    #[test]
    fn test_satisfy() {
        let input = vec!['1', 'x'];
        assert_eq!(digit().parse(&input, 0), Ok((1, 1)));
        assert_eq!(digit().parse(&input, 1), Err(ParseError::Unexpected(1)));
        assert_eq!(digit().parse(&input, 2), Err(ParseError::EOF));
    }

    #[test]
    fn test_choice() {
        let input = vec!['x', 'y'];
        let parser: Choice<char, char> =
            Choice::new(vec![Box::new(Equal::new('y')), Box::new(Equal::new('x'))]);

        assert_eq!(parser.parse(&input, 0), Ok((1, 'x')));
        assert_eq!(parser.parse(&input, 1), Ok((2, 'y')));
        assert_eq!(parser.parse(&input, 2), Err(ParseError::EOF));

        let parser: Choice<char, char> = Choice::new(vec![Box::new(Equal::new('z'))]);
        assert_eq!(parser.parse(&input, 0), Err(ParseError::NoAlternative));
    }

    #[test]
    fn test_tuple() {
        let input = vec!['-', '7'];
        let pair = Tuple2::new(Equal::new('-'), digit());
        assert_eq!(pair.parse(&input, 0), Ok((2, ('-', 7))));
    }

    #[test]
    fn test_many_and_map() {
        let input = vec!['1', '2', '3', 'x'];
        let parser = Map::new(Many::new(digit()), |ds: Vec<u32>| ds.iter().sum::<u32>());
        assert_eq!(parser.parse(&input, 0), Ok((3, 6)));
        assert_eq!(parser.parse(&input, 3), Ok((3, 0)));
    }

    #[test]
    fn test_separated_list() {
        let parser = SeparatedList::new(digit(), Equal::new(','));

        let input = vec!['1', ',', '2', ')'];
        assert_eq!(parser.parse(&input, 0), Ok((3, vec![1, 2])));

        let input = vec![')'];
        assert_eq!(parser.parse(&input, 0), Ok((0, vec![])));

        let input = vec!['1', ',', ')'];
        assert!(parser.parse(&input, 0).is_err());
    }

    #[test]
    fn test_delimited() {
        let input = vec!['(', '4', ')'];
        let parser = Delimited::new(Equal::new('('), digit(), Equal::new(')'));
        assert_eq!(parser.parse(&input, 0), Ok((3, 4)));

        let input = vec!['(', '4'];
        assert_eq!(parser.parse(&input, 0), Err(ParseError::EOF));
    }

    #[test]
    fn test_with_context() {
        let input = vec!['x'];
        let parser = WithContext::new(digit(), "digit");
        assert_eq!(
            parser.parse(&input, 0),
            Err(ParseError::WithContext {
                message: "digit".to_string(),
                inner: Box::new(ParseError::Unexpected(0)),
            })
        );
    }

    #[test]
    fn test_lazy() {
        let input = vec!['5'];
        let parser = Lazy::new(digit);
        assert_eq!(parser.parse(&input, 0), Ok((1, 5)));
    }
}
