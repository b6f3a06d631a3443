//! The dump orchestrator.

use super::{
    batcher::InsertBatcher,
    columns::{classify_columns, column_name_list, column_select_list},
    comments,
    enumerate::enumerate,
    escape::escape,
};
use crate::{
    Result,
    adapters::{AdapterRegistry, DumpAdapter},
    dsn::Dsn,
    error::DumpError,
    models::{Destination, ObjectKind, Row, SchemaObjects, TableColumns, TableDumpInfo, TableLimit},
    settings::Settings,
    sink::Sink,
    source::DataSource,
};
use chrono::Local;
use futures::TryStreamExt;
use serde_json::Value;
use std::collections::HashMap;

/// Hook rewriting a whole row before its values are escaped.
pub type RowTransform = Box<dyn Fn(&str, Row) -> Row + Send + Sync>;

/// Hook rewriting one column value: `(table, column, value, row)`.
pub type ColumnTransform =
    Box<dyn Fn(&str, &str, Option<Vec<u8>>, &Row) -> Option<Vec<u8>> + Send + Sync>;

/// Hook called after each table's rows are written.
pub type InfoHook = Box<dyn Fn(&TableDumpInfo) + Send + Sync>;

/// Session-level state held while one table's rows are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadGuard {
    None,
    Transaction,
    TableLock,
}

/// Drives one dump run from connection setup to the closing footer.
///
/// The dumper exclusively owns its data source and sink for the run. Every
/// step awaits the previous one; output is written strictly in order.
///
/// # Example
/// ```rust,no_run
/// use dbdump_core::{Destination, Dumper, MemorySink, Settings};
/// # use dbdump_core::DataSource;
///
/// # async fn example(source: Box<dyn DataSource>) -> dbdump_core::Result<()> {
/// let sink = MemorySink::new();
/// let mut dumper = Dumper::new(
///     "mysql:host=localhost;dbname=shop",
///     Settings::default(),
///     source,
///     Box::new(sink.clone()),
/// )?;
/// dumper.start(&Destination::Stdout).await?;
/// println!("{}", sink.contents());
/// # Ok(())
/// # }
/// ```
pub struct Dumper {
    dsn: Dsn,
    settings: Settings,
    adapter: Box<dyn DumpAdapter>,
    source: Box<dyn DataSource>,
    sink: Box<dyn Sink>,
    objects: SchemaObjects,
    column_types: HashMap<String, TableColumns>,
    table_wheres: HashMap<String, String>,
    table_limits: HashMap<String, TableLimit>,
    row_transform: Option<RowTransform>,
    column_transform: Option<ColumnTransform>,
    info_hook: Option<InfoHook>,
    server_version: String,
}

impl std::fmt::Debug for Dumper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dumper")
            .field("dialect", &self.dsn.dialect)
            .field("endpoint", &self.dsn.endpoint())
            .field("database", &self.dsn.database)
            .field("objects", &self.objects.object_count())
            .finish_non_exhaustive()
    }
}

impl Dumper {
    /// Creates a dumper using the built-in adapters.
    ///
    /// # Errors
    /// Returns [`DumpError::ConnectionString`] for a malformed DSN or one
    /// naming an unknown dialect.
    pub fn new(
        dsn: &str,
        settings: Settings,
        source: Box<dyn DataSource>,
        sink: Box<dyn Sink>,
    ) -> Result<Self> {
        Self::with_registry(dsn, settings, source, sink, &AdapterRegistry::with_defaults())
    }

    /// Creates a dumper resolving its adapter from `registry`.
    ///
    /// # Errors
    /// Returns [`DumpError::ConnectionString`] for a malformed DSN or one
    /// naming a dialect missing from the registry.
    pub fn with_registry(
        dsn: &str,
        settings: Settings,
        source: Box<dyn DataSource>,
        sink: Box<dyn Sink>,
        registry: &AdapterRegistry,
    ) -> Result<Self> {
        let dsn = Dsn::parse(dsn)?;
        let adapter = registry.create(&dsn.dialect, &settings)?;
        Ok(Self {
            dsn,
            settings,
            adapter,
            source,
            sink,
            objects: SchemaObjects::default(),
            column_types: HashMap::new(),
            table_wheres: HashMap::new(),
            table_limits: HashMap::new(),
            row_transform: None,
            column_transform: None,
            info_hook: None,
            server_version: String::new(),
        })
    }

    /// Per-table row filters, overriding the `where` setting.
    pub fn set_table_wheres(&mut self, wheres: HashMap<String, String>) {
        self.table_wheres = wheres;
    }

    /// Per-table row limits.
    ///
    /// Each value is a row count or an `[offset, count]` pair. Malformed
    /// values are dropped, leaving that table unlimited.
    pub fn set_table_limits(&mut self, limits: HashMap<String, Value>) {
        self.table_limits = limits
            .into_iter()
            .filter_map(|(table, raw)| match TableLimit::parse(&raw) {
                Some(limit) => Some((table, limit)),
                None => {
                    tracing::debug!("Ignoring malformed limit {} for table '{}'", raw, table);
                    None
                }
            })
            .collect();
    }

    /// Row filter for a table: its own override, else the `where` setting.
    pub fn table_where(&self, table: &str) -> Option<&str> {
        self.table_wheres
            .get(table)
            .map(String::as_str)
            .or_else(|| self.settings.default_where())
    }

    /// Row limit for a table, if any.
    pub fn table_limit(&self, table: &str) -> Option<TableLimit> {
        self.table_limits.get(table).copied()
    }

    /// Installs a hook applied to each row before its values are escaped.
    pub fn set_row_transform<F>(&mut self, transform: F)
    where
        F: Fn(&str, Row) -> Row + Send + Sync + 'static,
    {
        self.row_transform = Some(Box::new(transform));
    }

    /// Installs a hook applied to each column value after the row hook.
    pub fn set_column_transform<F>(&mut self, transform: F)
    where
        F: Fn(&str, &str, Option<Vec<u8>>, &Row) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        self.column_transform = Some(Box::new(transform));
    }

    /// Installs a hook called with each table's row count.
    pub fn set_info_hook<F>(&mut self, hook: F)
    where
        F: Fn(&TableDumpInfo) + Send + Sync + 'static,
    {
        self.info_hook = Some(Box::new(hook));
    }

    /// Current settings, including mid-run changes.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Objects found by the last enumeration.
    pub fn objects(&self) -> &SchemaObjects {
        &self.objects
    }

    /// Runs the whole dump into `destination`.
    ///
    /// # Errors
    /// Any failure aborts the run and is returned as-is. Output already
    /// written stays in the sink and must be treated as incomplete.
    pub async fn start(&mut self, destination: &Destination) -> Result<()> {
        let started = std::time::Instant::now();
        tracing::info!(
            "Dumping database '{}' from {} to {}",
            self.dsn.database,
            self.dsn.endpoint(),
            destination
        );

        for command in self.settings.init_commands() {
            self.source.execute(&command).await?;
        }
        self.server_version = self
            .source
            .server_version(self.adapter.server_version_query())
            .await?;

        self.sink.open(destination)?;

        if !self.settings.is_enabled("skip-comments") {
            let header = comments::header(
                self.dsn.endpoint(),
                &self.dsn.database,
                &self.server_version,
                self.dump_date(),
            );
            self.write(header)?;
        }
        self.write(self.adapter.backup_parameters())?;

        let databases = self.settings.is_enabled("databases");
        if databases {
            self.write(self.adapter.database_header(&self.dsn.database))?;
            if self.settings.is_enabled("add-drop-database") {
                self.write(self.adapter.drop_database(&self.dsn.database))?;
            }
        }

        let enumeration = enumerate(
            self.source.as_mut(),
            self.adapter.as_ref(),
            &self.settings,
            &self.dsn.database,
        )
        .await?;
        self.objects = enumeration.objects;
        if !enumeration.unmatched_views.is_empty() {
            tracing::debug!(
                "Included views not found: {}",
                enumeration.unmatched_views.join(",")
            );
        }

        if databases && !self.settings.is_enabled("no-create-db") {
            let defaults = self
                .source
                .query(&self.adapter.show_database_defaults())
                .await?
                .into_iter()
                .next()
                .unwrap_or_default();
            self.write(self.adapter.create_database(&self.dsn.database, &defaults))?;
        }

        self.settings
            .set_included_tables(enumeration.unmatched_tables.clone());
        if !enumeration.unmatched_tables.is_empty() {
            return Err(DumpError::SchemaResolution {
                missing: enumeration.unmatched_tables,
            });
        }

        self.export_tables().await?;
        self.export_views().await?;
        self.export_triggers().await?;
        self.export_functions().await?;
        self.export_procedures().await?;
        self.export_events().await?;

        self.write(self.adapter.restore_parameters())?;
        if !self.settings.is_enabled("skip-comments") {
            self.write(comments::footer(self.dump_date()))?;
        }
        self.sink.close()?;

        tracing::info!(
            "Dump of '{}' completed in {:.2?}: {} object(s)",
            self.dsn.database,
            started.elapsed(),
            self.objects.object_count()
        );
        Ok(())
    }

    /// Builds the row query for a table from its cached column types.
    ///
    /// Selecting a table with generated columns switches `complete-insert`
    /// on.
    pub fn select_statement(&mut self, table: &str) -> String {
        let columns = self.column_types.get(table).cloned().unwrap_or_default();
        let selected = column_select_list(self.adapter.as_ref(), &columns, &mut self.settings);
        let column_sql = if selected.is_empty() {
            "*".to_string()
        } else {
            selected.join(",")
        };

        let mut sql = format!(
            "SELECT {} FROM {}",
            column_sql,
            self.adapter.quote_identifier(table)
        );
        if let Some(condition) = self.table_where(table) {
            sql.push_str(&format!(" WHERE {}", condition));
        }
        if let Some(limit) = self.table_limit(table) {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }

    fn dump_date(&self) -> Option<chrono::DateTime<Local>> {
        (!self.settings.is_enabled("skip-dump-date")).then(Local::now)
    }

    fn write(&mut self, text: impl AsRef<[u8]>) -> Result<usize> {
        self.sink.write(text.as_ref())
    }

    fn comment(&mut self, title: &str) -> Result<()> {
        if !self.settings.is_enabled("skip-comments") {
            self.sink.write(comments::section(title).as_bytes())?;
        }
        Ok(())
    }

    async fn show_create(&mut self, kind: ObjectKind, name: &str) -> Result<Row> {
        let sql = self.adapter.show_create(kind, name);
        self.source
            .query(&sql)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DumpError::unexpected_result(format!("No definition returned for {} '{}'", kind, name))
            })
    }

    async fn load_column_types(&mut self, name: &str) -> Result<()> {
        let rows = self.source.query(&self.adapter.show_columns(name)).await?;
        let columns = classify_columns(self.adapter.as_ref(), &rows, &mut self.settings)?;
        self.column_types.insert(name.to_string(), columns);
        Ok(())
    }

    // ----- tables -----

    async fn export_tables(&mut self) -> Result<()> {
        for table in self.objects.tables.clone() {
            if self.settings.exclude_tables().matches(&table) {
                tracing::debug!("Skipping excluded table '{}'", table);
                continue;
            }
            self.export_table_structure(&table).await?;
            if self.settings.no_data().skips(&table) {
                tracing::debug!("Skipping rows of table '{}'", table);
            } else {
                self.export_table_rows(&table).await?;
            }
            self.column_types.remove(&table);
        }
        Ok(())
    }

    async fn export_table_structure(&mut self, table: &str) -> Result<()> {
        if !self.settings.is_enabled("no-create-info") {
            let definition = self.show_create(ObjectKind::Table, table).await?;
            self.comment(&format!(
                "Table structure for table {}",
                self.adapter.quote_identifier(table)
            ))?;
            if self.settings.is_enabled("add-drop-table") {
                self.write(self.adapter.drop_table(table))?;
            }
            self.write(self.adapter.create_table(&definition)?)?;
        }
        self.load_column_types(table).await
    }

    async fn export_table_rows(&mut self, table: &str) -> Result<()> {
        let select = self.select_statement(table);
        let quoted = self.adapter.quote_identifier(table);
        tracing::info!("Dumping rows of table {}", quoted);
        self.comment(&format!("Dumping data for table {}", quoted))?;

        let guard = self.read_guard();
        let outcome = match self.acquire_read_guard(table, guard).await {
            Ok(()) => self.write_rows(table, &select).await,
            Err(e) => Err(e),
        };
        let released = self.release_read_guard(table, guard).await;
        let rows = outcome?;
        released?;

        self.write("\n")?;
        if !self.settings.is_enabled("skip-comments") {
            self.write(comments::table_summary(&quoted, rows))?;
        }
        tracing::debug!("Dumped {} row(s) from {}", rows, quoted);
        if let Some(hook) = &self.info_hook {
            hook(&TableDumpInfo {
                name: table.to_string(),
                row_count: rows,
            });
        }
        Ok(())
    }

    fn read_guard(&self) -> ReadGuard {
        if self.settings.is_enabled("single-transaction") {
            ReadGuard::Transaction
        } else if self.settings.is_enabled("lock-tables") {
            ReadGuard::TableLock
        } else {
            ReadGuard::None
        }
    }

    async fn acquire_read_guard(&mut self, table: &str, guard: ReadGuard) -> Result<()> {
        match guard {
            ReadGuard::None => Ok(()),
            ReadGuard::Transaction => {
                self.source.execute(&self.adapter.setup_transaction()).await?;
                self.source.execute(&self.adapter.start_transaction()).await
            }
            ReadGuard::TableLock => self.source.execute(&self.adapter.lock_table(table)).await,
        }
    }

    async fn release_read_guard(&mut self, table: &str, guard: ReadGuard) -> Result<()> {
        match guard {
            ReadGuard::None => Ok(()),
            ReadGuard::Transaction => self.source.execute(&self.adapter.commit_transaction()).await,
            ReadGuard::TableLock => self.source.execute(&self.adapter.unlock_table(table)).await,
        }
    }

    async fn write_rows(&mut self, table: &str, select: &str) -> Result<u64> {
        let add_locks = self.settings.is_enabled("add-locks");
        let disable_keys = self.settings.is_enabled("disable-keys");
        let no_autocommit = self.settings.is_enabled("no-autocommit");

        if add_locks {
            self.write(self.adapter.start_add_lock_table(table))?;
        }
        if disable_keys {
            self.write(self.adapter.start_disable_keys(table))?;
        }
        if no_autocommit {
            self.write(self.adapter.start_disable_autocommit())?;
        }

        let rows = self.stream_rows(table, select).await?;

        if no_autocommit {
            self.write(self.adapter.end_disable_autocommit())?;
        }
        if disable_keys {
            self.write(self.adapter.end_disable_keys(table))?;
        }
        if add_locks {
            self.write(self.adapter.end_add_lock_table(table))?;
        }
        Ok(rows)
    }

    fn insert_prefix(&self, table: &str) -> String {
        let verb = if self.settings.is_enabled("replace") {
            "REPLACE INTO"
        } else if self.settings.is_enabled("insert-ignore") {
            "INSERT IGNORE INTO"
        } else {
            "INSERT INTO"
        };
        let column_list = match self.column_types.get(table) {
            Some(columns) if self.settings.is_enabled("complete-insert") => {
                format!(" ({})", column_name_list(self.adapter.as_ref(), columns).join(", "))
            }
            _ => String::new(),
        };
        format!(
            "{} {}{} VALUES ",
            verb,
            self.adapter.quote_identifier(table),
            column_list
        )
    }

    async fn stream_rows(&mut self, table: &str, select: &str) -> Result<u64> {
        let mut batcher = InsertBatcher::new(
            self.insert_prefix(table),
            self.settings.is_enabled("extended-insert"),
            self.settings.net_buffer_length(),
        );
        let hex_blob = self.settings.is_enabled("hex-blob");
        let quote = self.source.quoter();
        let columns = self.column_types.get(table).cloned().unwrap_or_default();

        let mut stream = self.source.fetch(select);
        while let Some(row) = stream.try_next().await? {
            let row = match &self.row_transform {
                Some(transform) => transform(table, row),
                None => row,
            };
            let values: Vec<Vec<u8>> = row
                .iter()
                .map(|(column, value)| {
                    let value = match &self.column_transform {
                        Some(transform) => transform(table, column, value.map(<[u8]>::to_vec), &row),
                        None => value.map(<[u8]>::to_vec),
                    };
                    escape(value.as_deref(), columns.get(column), hex_blob, quote)
                })
                .collect();
            let chunk = batcher.push(&values.join(b",".as_slice()));
            self.sink.write(&chunk)?;
        }
        drop(stream);

        let tail = batcher.finish();
        if !tail.is_empty() {
            self.sink.write(&tail)?;
        }
        Ok(batcher.rows())
    }

    // ----- views -----

    async fn export_views(&mut self) -> Result<()> {
        if self.settings.is_enabled("no-create-info") {
            return Ok(());
        }
        let views: Vec<String> = self
            .objects
            .views
            .iter()
            .filter(|view| !self.settings.exclude_tables().matches(view))
            .cloned()
            .collect();

        // Stand-in tables first, so views referencing other views load.
        for view in &views {
            self.load_column_types(view).await?;
            let quoted = self.adapter.quote_identifier(view);
            self.comment(&format!("Stand-In structure for view {}", quoted))?;
            if self.settings.is_enabled("add-drop-table") {
                self.write(self.adapter.drop_stand_in_table(view))?;
                self.write(self.adapter.drop_view(view))?;
            }
            let columns = self.column_types.get(view).cloned().unwrap_or_default();
            self.write(self.adapter.create_stand_in_table(view, &columns))?;
        }

        for view in &views {
            let definition = self.show_create(ObjectKind::View, view).await?;
            let quoted = self.adapter.quote_identifier(view);
            self.comment(&format!("View structure for view {}", quoted))?;
            self.write(self.adapter.drop_stand_in_table(view))?;
            self.write(self.adapter.drop_view(view))?;
            self.write(self.adapter.create_view(&definition)?)?;
            self.column_types.remove(view);
        }
        Ok(())
    }

    // ----- triggers, routines, events -----

    async fn export_triggers(&mut self) -> Result<()> {
        for trigger in self.objects.triggers.clone() {
            let definition = self.show_create(ObjectKind::Trigger, &trigger).await?;
            if self.settings.is_enabled("add-drop-trigger") {
                self.write(self.adapter.drop_trigger(&trigger))?;
            }
            self.write(self.adapter.create_trigger(&definition)?)?;
        }
        Ok(())
    }

    async fn export_functions(&mut self) -> Result<()> {
        if !self.objects.functions.is_empty() || !self.objects.procedures.is_empty() {
            self.comment(&format!("Dumping routines for database '{}'", self.dsn.database))?;
        }
        for function in self.objects.functions.clone() {
            let definition = self.show_create(ObjectKind::Function, &function).await?;
            self.write(self.adapter.drop_function(&function))?;
            self.write(self.adapter.create_function(&definition)?)?;
        }
        Ok(())
    }

    async fn export_procedures(&mut self) -> Result<()> {
        for procedure in self.objects.procedures.clone() {
            let definition = self.show_create(ObjectKind::Procedure, &procedure).await?;
            self.write(self.adapter.drop_procedure(&procedure))?;
            self.write(self.adapter.create_procedure(&definition)?)?;
        }
        Ok(())
    }

    async fn export_events(&mut self) -> Result<()> {
        if !self.objects.events.is_empty() {
            self.comment(&format!("Dumping events for database '{}'", self.dsn.database))?;
        }
        for event in self.objects.events.clone() {
            let definition = self.show_create(ObjectKind::Event, &event).await?;
            self.write(self.adapter.drop_event(&event))?;
            self.write(self.adapter.create_event(&definition)?)?;
        }
        Ok(())
    }
}
