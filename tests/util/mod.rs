use sqlvis::session::Session;
use sqlvis::source::{ColumnMeta, MemoryCursor, QueryError, QueryExecutor, RowCursor, SqlType, SqlValue};
use sqlvis::view::{ExclusionSet, Output, Span, TerminalSink, VisualizationState};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Terminal double that keeps every span it is given.
#[derive(Clone, Default)]
pub struct RecordingTerminal {
    spans: Rc<RefCell<Vec<Span>>>,
}

#[allow(dead_code)]
impl RecordingTerminal {
    pub fn spans(&self) -> Vec<Span> {
        self.spans.borrow().clone()
    }

    pub fn text(&self) -> String {
        self.spans.borrow().iter().map(|s| s.text.as_str()).collect()
    }

    pub fn clear(&self) {
        self.spans.borrow_mut().clear();
    }
}

impl TerminalSink for RecordingTerminal {
    fn write_spans(&mut self, spans: &[Span]) -> std::io::Result<()> {
        self.spans.borrow_mut().extend_from_slice(spans);
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Log sink shared between the session and the test.
#[derive(Clone, Default)]
pub struct SharedLog(Rc<RefCell<Vec<u8>>>);

#[allow(dead_code)]
impl SharedLog {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl std::io::Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Executor double answering from a fixed table of results and counting calls.
#[derive(Default)]
pub struct ScriptedExecutor {
    results: HashMap<String, Result<MemoryCursor, QueryError>>,
    calls: Rc<RefCell<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn with(mut self, sql: &str, cursor: MemoryCursor) -> Self {
        self.results.insert(sql.to_string(), Ok(cursor));
        self
    }

    pub fn failing(mut self, sql: &str, err: QueryError) -> Self {
        self.results.insert(sql.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
        self.calls.clone()
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn execute(&mut self, sql: &str) -> Result<Box<dyn RowCursor>, QueryError> {
        self.calls.borrow_mut().push(sql.to_string());
        match self.results.get(sql) {
            Some(Ok(cursor)) => Ok(Box::new(cursor.clone())),
            Some(Err(err)) => Err(err.clone()),
            None => Err(QueryError::Prepare(format!("no such table in: {sql}"))),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Session wired to test doubles.
#[allow(dead_code)]
pub struct Harness {
    pub session: Session,
    pub screen: RecordingTerminal,
    pub log: SharedLog,
    pub calls: Rc<RefCell<Vec<String>>>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(executor: ScriptedExecutor, exclude: &[&str]) -> Self {
        let screen = RecordingTerminal::default();
        let log = SharedLog::default();
        let calls = executor.calls();
        let out = Output::new(Box::new(screen.clone()), Box::new(log.clone()));
        let session = Session::new(
            Box::new(executor),
            ExclusionSet::new(exclude.iter().copied()),
            VisualizationState::default(),
            out,
        );
        Self {
            session,
            screen,
            log,
            calls,
        }
    }

    /// Run one input line and return what it printed.
    pub fn run(&mut self, line: &str) -> String {
        self.screen.clear();
        self.session.handle_line(line).expect("in-memory sinks do not fail");
        self.screen.text()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

/// Single-column integer result.
#[allow(dead_code)]
pub fn int_column(name: &str, values: &[i64]) -> MemoryCursor {
    MemoryCursor::new(
        vec![ColumnMeta::new(name, SqlType::Integer)],
        values.iter().map(|v| vec![SqlValue::Integer(*v)]).collect(),
    )
}

/// `id` (key), `name` (text), `qty` (integer), `price` (real).
#[allow(dead_code)]
pub fn orders() -> MemoryCursor {
    let rows = [
        (1, "apple", 10, 1.5),
        (2, "banana", 25, 0.25),
        (3, "cherry", 40, 12.0),
        (4, "date", 5, 3.75),
    ];
    MemoryCursor::new(
        vec![
            ColumnMeta::new("ID", SqlType::Integer),
            ColumnMeta::new("Name", SqlType::VarChar),
            ColumnMeta::new("Qty", SqlType::Integer),
            ColumnMeta::new("Price", SqlType::Double),
        ],
        rows.iter()
            .map(|(id, name, qty, price)| {
                vec![
                    SqlValue::Integer(*id),
                    SqlValue::Text((*name).to_string()),
                    SqlValue::Integer(*qty),
                    SqlValue::Real(*price),
                ]
            })
            .collect(),
    )
}

/// Lines made only of dashes.
#[allow(dead_code)]
pub fn rules(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|l| !l.is_empty() && l.chars().all(|c| c == '-'))
        .collect()
}

/// Lines of the table body (header, data, scale, stats).
#[allow(dead_code)]
pub fn table_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| l.starts_with('|')).collect()
}
