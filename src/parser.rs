use crate::ast::*;
use crate::data_type::ColumnType;
use crate::error::{Error, Result};
use crate::operator::EqualityOperator;
use crate::tokenizer::{Token, TokenKind};

/// Turns a token sequence into one [Operation].
///
/// Each statement has a fixed shape: keywords and punctuation are expected
/// at known positions, lists advance two tokens at a time (item, then `,` or
/// the closing token). Any mismatch is reported as [Error::Syntax] naming
/// what was expected.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(mut self) -> Result<Operation> {
        let keyword = match self.tokens.first() {
            Some(token) => token.text.to_ascii_uppercase(),
            None => return Err(Error::syntax("no operation could be created, no tokens")),
        };
        self.advance();

        match keyword.as_str() {
            "SELECT" => self.parse_select(),
            "CREATE" => self.parse_create_table(),
            "INSERT" => self.parse_insert(),
            "UPDATE" => self.parse_update(),
            "DELETE" => self.parse_delete(),
            "DROP" => self.parse_drop_table(),
            _ => Err(Error::Syntax(format!(
                "invalid or not supported operation '{}'",
                self.tokens[0].text
            ))),
        }
    }

    //helpers
    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = match self.current_token() {
            Some(token) => format!("'{}'", token.text),
            None => "end of query".to_string(),
        };
        Error::Syntax(format!("expected {expected}, found {found}"))
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.current_token().is_some_and(|t| t.is_keyword(keyword))
    }

    fn check_kind(&self, kind: TokenKind) -> bool {
        self.current_token().is_some_and(|t| t.kind == kind)
    }

    fn check_symbol(&self, symbol: &str) -> bool {
        self.current_token()
            .is_some_and(|t| t.kind != TokenKind::Text && t.text == symbol)
    }

    fn consume_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn consume_symbol(&mut self, symbol: &str) -> Result<()> {
        if self.check_symbol(symbol) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{symbol}'")))
        }
    }

    /// Consumes a [TokenKind::Text] token: a name or a value.
    fn consume_text(&mut self, what: &str) -> Result<String> {
        match self.current_token() {
            Some(token) if token.kind == TokenKind::Text => {
                let text = token.text.clone();
                self.advance();
                Ok(text)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Like [Parser::consume_text], also telling whether the token was quoted.
    fn consume_operand(&mut self, what: &str) -> Result<(String, bool)> {
        let quoted = self.current_token().is_some_and(|t| t.quoted);
        Ok((self.consume_text(what)?, quoted))
    }

    fn consume_end(&self) -> Result<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of query"))
        }
    }

    /// Parses `( item [, item]* )`.
    fn parse_parenthesized<T, F>(&mut self, mut item: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        self.consume_symbol("(")?;
        let mut items = vec![];
        loop {
            items.push(item(self)?);
            if self.check_kind(TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.consume_symbol(")")?;
            return Ok(items);
        }
    }

    /// One operator, or two adjacent ones combined (`<=`, `>=`).
    fn parse_operator(&mut self) -> Result<EqualityOperator> {
        let mut operator = self.single_operator()?;
        if self.check_kind(TokenKind::Operator) {
            operator = operator | self.single_operator()?;
        }
        Ok(operator)
    }

    fn single_operator(&mut self) -> Result<EqualityOperator> {
        let operator = self
            .current_token()
            .filter(|t| t.kind == TokenKind::Operator)
            .and_then(|t| EqualityOperator::from_symbol(&t.text))
            .ok_or_else(|| self.unexpected("comparison operator"))?;
        self.advance();
        Ok(operator)
    }

    fn parse_create_table(&mut self) -> Result<Operation> {
        self.consume_keyword("TABLE")?;
        let name = self.consume_text("table name")?;
        let columns = self.parse_parenthesized(|p| {
            let name = p.consume_text("column name")?;
            let column_type: ColumnType = p.consume_text("column type")?.parse()?;
            Ok(ColumnDef { name, column_type })
        })?;
        self.consume_end()?;
        Ok(Operation::CreateTable(CreateTable { name, columns }))
    }

    fn parse_drop_table(&mut self) -> Result<Operation> {
        self.consume_keyword("TABLE")?;
        let name = self.consume_text("table name")?;
        self.consume_end()?;
        Ok(Operation::DropTable(DropTable { name }))
    }

    fn parse_insert(&mut self) -> Result<Operation> {
        self.consume_keyword("INTO")?;
        let table = self.consume_text("table name")?;
        let values = self.parse_row_values()?;
        self.consume_end()?;
        Ok(Operation::InsertInto(InsertInto { table, values }))
    }

    fn parse_update(&mut self) -> Result<Operation> {
        let table = self.consume_text("table name")?;
        let values = self.parse_row_values()?;
        let (filters, _) = self.parse_clauses(false)?;
        Ok(Operation::Update(Update {
            table,
            values,
            filters,
        }))
    }

    fn parse_delete(&mut self) -> Result<Operation> {
        self.consume_keyword("FROM")?;
        let table = self.consume_text("table name")?;
        let (filters, _) = self.parse_clauses(false)?;
        Ok(Operation::Delete(Delete { table, filters }))
    }

    fn parse_select(&mut self) -> Result<Operation> {
        let mut columns = vec![];
        loop {
            if self.check_kind(TokenKind::Asterisk) {
                columns.push("*".to_string());
                self.advance();
            } else {
                columns.push(self.consume_text("column name or '*'")?);
            }
            if self.check_kind(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }

        self.consume_keyword("FROM")?;
        let table = self.consume_text("table name")?;
        let (filters, sorters) = self.parse_clauses(true)?;

        Ok(Operation::Select(Select {
            columns,
            table,
            filters,
            sorters,
        }))
    }

    /// `( col [, col]* ) VALUES ( val [, val]* )`, paired up by position.
    fn parse_row_values(&mut self) -> Result<Vec<RowValue>> {
        let columns = self.parse_parenthesized(|p| p.consume_text("column name"))?;
        self.consume_keyword("VALUES")?;
        let values = self.parse_parenthesized(|p| p.consume_text("value"))?;

        if columns.len() != values.len() {
            return Err(Error::Syntax(format!(
                "{} columns but {} values",
                columns.len(),
                values.len()
            )));
        }

        Ok(columns
            .into_iter()
            .zip(values)
            .map(|(column, value)| RowValue { column, value })
            .collect())
    }

    /// Trailing `WHERE` (and, for a select, `ORDER BY`) clauses, in any
    /// number. Filters and sorters accumulate in order.
    fn parse_clauses(&mut self, allow_order: bool) -> Result<(Vec<Filter>, Vec<Sorter>)> {
        let mut filters = vec![];
        let mut sorters = vec![];

        while !self.is_at_end() {
            if self.check_keyword("WHERE") {
                self.advance();
                filters.extend(self.parse_filters()?);
            } else if allow_order && self.check_keyword("ORDER") {
                self.advance();
                self.consume_keyword("BY")?;
                sorters.extend(self.parse_order()?);
            } else if allow_order {
                return Err(self.unexpected("WHERE or ORDER BY"));
            } else {
                return Err(self.unexpected("WHERE"));
            }
        }

        Ok((filters, sorters))
    }

    /// `v1 op1 pivot [op2 v2]`.
    ///
    /// In a range the pivot is the column. A one-sided comparison takes the
    /// unquoted operand as the column when the other one is quoted; with two
    /// bare words the filter is left ambiguous and the table picks the side
    /// that names a column (`x > 5` and `5 < x` both filter on `x`).
    fn parse_filters(&mut self) -> Result<Vec<Filter>> {
        let (first_value, first_quoted) = self.consume_operand("comparison value")?;
        let first_operator = self.parse_operator()?;
        let (pivot, pivot_quoted) = self.consume_operand("column name")?;

        if !self.check_kind(TokenKind::Operator) {
            let filter = match (first_quoted, pivot_quoted) {
                (false, true) => Filter::new(first_value, first_operator, pivot),
                (true, _) => Filter::new(pivot, first_operator.inverse(), first_value),
                (false, false) => Filter::ambiguous(pivot, first_operator.inverse(), first_value),
            };
            return Ok(vec![filter]);
        }

        let operator = self.parse_operator()?;
        let value = self.consume_text("comparison value")?;
        Ok(vec![
            Filter::new(pivot.clone(), first_operator.inverse(), first_value),
            Filter::new(pivot, operator, value),
        ])
    }

    /// `col [ASC|DESC] [, col [ASC|DESC]]*`
    fn parse_order(&mut self) -> Result<Vec<Sorter>> {
        let mut sorters = vec![];
        loop {
            let column = self.consume_text("column name")?;
            let mut direction = SortDirection::Ascending;
            if self.check_kind(TokenKind::Text)
                && !self.check_keyword("WHERE")
                && !self.check_keyword("ORDER")
            {
                direction = self.consume_text("sort direction")?.parse()?;
            }
            sorters.push(Sorter { column, direction });

            if self.check_kind(TokenKind::Comma) {
                self.advance();
                continue;
            }
            return Ok(sorters);
        }
    }
}

/// Shortcut for `Parser::new(tokens).parse()`.
pub fn parse(tokens: Vec<Token>) -> Result<Operation> {
    Parser::new(tokens).parse()
}
