//! MySQL dump adapter.
//!
//! # Module Structure
//! - `type_mapping`: column type tags and numeric/blob/generated classification
//! - `definer`: version-gated rewrites of `SHOW CREATE` output
//!
//! The adapter reads the handful of settings that shape its output once, at
//! construction, so it holds no reference to [`Settings`].

pub mod definer;
pub mod type_mapping;

#[cfg(test)]
mod tests;

use super::{AdapterFeature, DumpAdapter};
use crate::{
    Result,
    error::DumpError,
    models::{ColumnType, ObjectKind, Row, TableColumns},
    settings::{CharacterSet, Settings},
};

pub use type_mapping::{classify_mysql_column, type_tag};

/// Dialect tag of this adapter.
pub const DIALECT: &str = "mysql";

/// Registry factory for [`MySqlDumpAdapter`].
pub fn factory(settings: &Settings) -> Box<dyn DumpAdapter> {
    Box::new(MySqlDumpAdapter::new(settings))
}

/// MySQL implementation of [`DumpAdapter`].
#[derive(Debug, Clone)]
pub struct MySqlDumpAdapter {
    character_set: CharacterSet,
    skip_definer: bool,
    skip_tz_utc: bool,
    no_autocommit: bool,
    reset_auto_increment: bool,
    if_not_exists: bool,
}

impl MySqlDumpAdapter {
    /// Creates the adapter from the options that affect its SQL text.
    pub fn new(settings: &Settings) -> Self {
        Self {
            character_set: settings.default_character_set(),
            skip_definer: settings.is_enabled("skip-definer"),
            skip_tz_utc: settings.is_enabled("skip-tz-utc"),
            no_autocommit: settings.is_enabled("no-autocommit"),
            reset_auto_increment: settings.is_enabled("reset-auto-increment"),
            if_not_exists: settings.is_enabled("if-not-exists"),
        }
    }

    fn quote_literal(value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

fn required<'r>(row: &'r Row, column: &str, object: &str) -> Result<&'r str> {
    row.value(column).ok_or_else(|| {
        DumpError::unexpected_result(format!(
            "Error getting {} code, unknown output: missing column '{}'",
            object, column
        ))
    })
}

impl DumpAdapter for MySqlDumpAdapter {
    fn dialect(&self) -> &'static str {
        DIALECT
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        matches!(
            feature,
            AdapterFeature::SchemaIntrospection
                | AdapterFeature::ConsistentSnapshot
                | AdapterFeature::TableLocking
                | AdapterFeature::Routines
                | AdapterFeature::Events
                | AdapterFeature::HexBlob
        )
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn list_objects(&self, kind: ObjectKind, database: &str) -> String {
        let schema = Self::quote_literal(database);
        match kind {
            ObjectKind::Table => format!(
                "SELECT TABLE_NAME AS tbl_name FROM INFORMATION_SCHEMA.TABLES \
                 WHERE TABLE_TYPE='BASE TABLE' AND TABLE_SCHEMA={}",
                schema
            ),
            ObjectKind::View => format!(
                "SELECT TABLE_NAME AS tbl_name FROM INFORMATION_SCHEMA.TABLES \
                 WHERE TABLE_TYPE='VIEW' AND TABLE_SCHEMA={}",
                schema
            ),
            ObjectKind::Trigger => format!("SHOW TRIGGERS FROM {};", self.quote_identifier(database)),
            ObjectKind::Procedure => format!(
                "SELECT SPECIFIC_NAME AS procedure_name FROM INFORMATION_SCHEMA.ROUTINES \
                 WHERE ROUTINE_TYPE='PROCEDURE' AND ROUTINE_SCHEMA={}",
                schema
            ),
            ObjectKind::Function => format!(
                "SELECT SPECIFIC_NAME AS function_name FROM INFORMATION_SCHEMA.ROUTINES \
                 WHERE ROUTINE_TYPE='FUNCTION' AND ROUTINE_SCHEMA={}",
                schema
            ),
            ObjectKind::Event => format!(
                "SELECT EVENT_NAME AS event_name FROM INFORMATION_SCHEMA.EVENTS \
                 WHERE EVENT_SCHEMA={}",
                schema
            ),
        }
    }

    fn listed_name<'r>(&self, kind: ObjectKind, row: &'r Row) -> Option<&'r str> {
        match kind {
            // SHOW TRIGGERS puts the name in the `Trigger` column
            ObjectKind::Trigger => row.value("Trigger"),
            _ => row.first(),
        }
    }

    fn show_columns(&self, table: &str) -> String {
        format!("SHOW COLUMNS FROM {};", self.quote_identifier(table))
    }

    fn show_create(&self, kind: ObjectKind, name: &str) -> String {
        let keyword = match kind {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::Procedure => "PROCEDURE",
            ObjectKind::Function => "FUNCTION",
            ObjectKind::Event => "EVENT",
        };
        format!("SHOW CREATE {} {}", keyword, self.quote_identifier(name))
    }

    fn server_version_query(&self) -> &'static str {
        "SELECT VERSION()"
    }

    fn create_table(&self, row: &Row) -> Result<String> {
        let mut statement = required(row, "Create Table", "table")?.to_string();
        if self.reset_auto_increment {
            statement = definer::strip_auto_increment(&statement);
        }
        if self.if_not_exists {
            if let Some(rest) = statement.strip_prefix("CREATE TABLE") {
                statement = format!("CREATE TABLE IF NOT EXISTS{}", rest);
            }
        }
        Ok(format!(
            "/*!40101 SET @saved_cs_client     = @@character_set_client */;\n\
             /*!40101 SET character_set_client = {} */;\n\
             {};\n\
             /*!40101 SET character_set_client = @saved_cs_client */;\n\n",
            self.character_set, statement
        ))
    }

    fn create_view(&self, row: &Row) -> Result<String> {
        let statement = required(row, "Create View", "view")?;
        Ok(format!(
            "{};\n\n",
            definer::rewrite_view(statement, self.skip_definer)
        ))
    }

    fn create_trigger(&self, row: &Row) -> Result<String> {
        let statement = required(row, "SQL Original Statement", "trigger")?;
        Ok(format!(
            "DELIMITER ;;\n{};;\nDELIMITER ;\n\n",
            definer::rewrite_trigger(statement, self.skip_definer)
        ))
    }

    fn create_procedure(&self, row: &Row) -> Result<String> {
        let mut statement = required(row, "Create Procedure", "procedure")?.to_string();
        if self.skip_definer {
            statement = definer::strip_procedure_definer(&statement);
        }
        Ok(format!(
            "/*!40101 SET @saved_cs_client     = @@character_set_client */;\n\
             /*!40101 SET character_set_client = {} */;\n\
             DELIMITER ;;\n\
             {} ;;\n\
             DELIMITER ;\n\
             /*!40101 SET character_set_client = @saved_cs_client */;\n\n",
            self.character_set, statement
        ))
    }

    fn create_function(&self, row: &Row) -> Result<String> {
        let mut statement = required(row, "Create Function", "function")?.to_string();
        if self.skip_definer {
            statement = definer::strip_function_definer(&statement);
        }
        let client_charset = row
            .value("character_set_client")
            .unwrap_or(self.character_set.as_str());
        let collation = row.value("collation_connection").unwrap_or("utf8_general_ci");
        let sql_mode = row.value("sql_mode").unwrap_or_default();
        Ok(format!(
            "/*!40101 SET @saved_cs_client     = @@character_set_client */;\n\
             /*!50003 SET @saved_cs_results     = @@character_set_results */ ;\n\
             /*!50003 SET @saved_col_connection = @@collation_connection */ ;\n\
             /*!40101 SET character_set_client = {charset} */;\n\
             /*!40101 SET character_set_results = {charset} */;\n\
             /*!50003 SET collation_connection  = {collation} */ ;\n\
             /*!50003 SET @saved_sql_mode       = @@sql_mode */ ;\n\
             /*!50003 SET sql_mode              = {sql_mode} */ ;\n\
             DELIMITER ;;\n\
             {statement} ;;\n\
             DELIMITER ;\n\
             /*!50003 SET sql_mode              = @saved_sql_mode */ ;\n\
             /*!50003 SET character_set_client  = @saved_cs_client */ ;\n\
             /*!50003 SET character_set_results = @saved_cs_results */ ;\n\
             /*!50003 SET collation_connection  = @saved_col_connection */ ;\n\n",
            charset = client_charset,
            collation = collation,
            sql_mode = Self::quote_literal(sql_mode),
            statement = statement,
        ))
    }

    fn create_event(&self, row: &Row) -> Result<String> {
        let statement = required(row, "Create Event", "event")?;
        let sql_mode = row.value("sql_mode").unwrap_or_default();
        Ok(format!(
            "/*!50106 SET @save_time_zone= @@TIME_ZONE */ ;\n\
             DELIMITER ;;\n\
             /*!50003 SET @saved_cs_client      = @@character_set_client */ ;;\n\
             /*!50003 SET @saved_cs_results     = @@character_set_results */ ;;\n\
             /*!50003 SET @saved_col_connection = @@collation_connection */ ;;\n\
             /*!50003 SET character_set_client  = utf8 */ ;;\n\
             /*!50003 SET character_set_results = utf8 */ ;;\n\
             /*!50003 SET collation_connection  = utf8_general_ci */ ;;\n\
             /*!50003 SET @saved_sql_mode       = @@sql_mode */ ;;\n\
             /*!50003 SET sql_mode              = {sql_mode} */ ;;\n\
             /*!50003 SET @saved_time_zone      = @@time_zone */ ;;\n\
             /*!50003 SET time_zone             = 'SYSTEM' */ ;;\n\
             {statement} ;;\n\
             /*!50003 SET time_zone             = @saved_time_zone */ ;;\n\
             /*!50003 SET sql_mode              = @saved_sql_mode */ ;;\n\
             /*!50003 SET character_set_client  = @saved_cs_client */ ;;\n\
             /*!50003 SET character_set_results = @saved_cs_results */ ;;\n\
             /*!50003 SET collation_connection  = @saved_col_connection */ ;;\n\
             DELIMITER ;\n\
             /*!50106 SET TIME_ZONE= @save_time_zone */ ;\n\n",
            sql_mode = Self::quote_literal(sql_mode),
            statement = definer::rewrite_event(statement, self.skip_definer),
        ))
    }

    fn create_stand_in_table(&self, view: &str, columns: &TableColumns) -> String {
        let definitions: Vec<String> = columns
            .iter()
            .map(|column| format!("{} {}", self.quote_identifier(&column.name), column.type_sql))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
            self.quote_identifier(view),
            definitions.join("\n,")
        )
    }

    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {};\n", self.quote_identifier(table))
    }

    fn drop_stand_in_table(&self, view: &str) -> String {
        format!("DROP TABLE IF EXISTS {};\n", self.quote_identifier(view))
    }

    fn drop_view(&self, view: &str) -> String {
        format!("/*!50001 DROP VIEW IF EXISTS {}*/;\n", self.quote_identifier(view))
    }

    fn drop_trigger(&self, trigger: &str) -> String {
        format!("DROP TRIGGER IF EXISTS {};\n", self.quote_identifier(trigger))
    }

    fn drop_procedure(&self, procedure: &str) -> String {
        format!(
            "/*!50003 DROP PROCEDURE IF EXISTS {} */;\n",
            self.quote_identifier(procedure)
        )
    }

    fn drop_function(&self, function: &str) -> String {
        format!(
            "/*!50003 DROP FUNCTION IF EXISTS {} */;\n",
            self.quote_identifier(function)
        )
    }

    fn drop_event(&self, event: &str) -> String {
        format!("/*!50106 DROP EVENT IF EXISTS {} */;\n", self.quote_identifier(event))
    }

    fn database_header(&self, database: &str) -> String {
        format!(
            "--\n-- Current Database: {}\n--\n\n",
            self.quote_identifier(database)
        )
    }

    fn drop_database(&self, database: &str) -> String {
        format!(
            "/*!40000 DROP DATABASE IF EXISTS {}*/;\n\n",
            self.quote_identifier(database)
        )
    }

    fn show_database_defaults(&self) -> String {
        "SELECT @@character_set_database AS character_set_database, \
         @@collation_database AS collation_database"
            .to_string()
    }

    fn create_database(&self, database: &str, defaults: &Row) -> String {
        let name = self.quote_identifier(database);
        let character_set = defaults
            .value("character_set_database")
            .unwrap_or(self.character_set.as_str());
        let collation = defaults
            .value("collation_database")
            .map(|collation| format!(" COLLATE {}", collation))
            .unwrap_or_default();
        format!(
            "CREATE DATABASE /*!32312 IF NOT EXISTS*/ {name} \
             /*!40100 DEFAULT CHARACTER SET {character_set}{collation} */;\n\n\
             USE {name};\n\n"
        )
    }

    fn backup_parameters(&self) -> String {
        let mut out = format!(
            "/*!40101 SET @OLD_CHARACTER_SET_CLIENT=@@CHARACTER_SET_CLIENT */;\n\
             /*!40101 SET @OLD_CHARACTER_SET_RESULTS=@@CHARACTER_SET_RESULTS */;\n\
             /*!40101 SET @OLD_COLLATION_CONNECTION=@@COLLATION_CONNECTION */;\n\
             /*!40101 SET NAMES {} */;\n",
            self.character_set
        );
        if !self.skip_tz_utc {
            out.push_str(
                "/*!40103 SET @OLD_TIME_ZONE=@@TIME_ZONE */;\n\
                 /*!40103 SET TIME_ZONE='+00:00' */;\n",
            );
        }
        if self.no_autocommit {
            out.push_str("/*!40101 SET @OLD_AUTOCOMMIT=@@AUTOCOMMIT */;\n");
        }
        out.push_str(
            "/*!40014 SET @OLD_UNIQUE_CHECKS=@@UNIQUE_CHECKS, UNIQUE_CHECKS=0 */;\n\
             /*!40014 SET @OLD_FOREIGN_KEY_CHECKS=@@FOREIGN_KEY_CHECKS, FOREIGN_KEY_CHECKS=0 */;\n\
             /*!40101 SET @OLD_SQL_MODE=@@SQL_MODE, SQL_MODE='NO_AUTO_VALUE_ON_ZERO' */;\n\
             /*!40111 SET @OLD_SQL_NOTES=@@SQL_NOTES, SQL_NOTES=0 */;\n\n",
        );
        out
    }

    fn restore_parameters(&self) -> String {
        let mut out = String::new();
        if !self.skip_tz_utc {
            out.push_str("/*!40103 SET TIME_ZONE=@OLD_TIME_ZONE */;\n");
        }
        if self.no_autocommit {
            out.push_str("/*!40101 SET AUTOCOMMIT=@OLD_AUTOCOMMIT */;\n");
        }
        out.push_str(
            "/*!40101 SET SQL_MODE=@OLD_SQL_MODE */;\n\
             /*!40014 SET FOREIGN_KEY_CHECKS=@OLD_FOREIGN_KEY_CHECKS */;\n\
             /*!40014 SET UNIQUE_CHECKS=@OLD_UNIQUE_CHECKS */;\n\
             /*!40101 SET CHARACTER_SET_CLIENT=@OLD_CHARACTER_SET_CLIENT */;\n\
             /*!40101 SET CHARACTER_SET_RESULTS=@OLD_CHARACTER_SET_RESULTS */;\n\
             /*!40101 SET COLLATION_CONNECTION=@OLD_COLLATION_CONNECTION */;\n\
             /*!40111 SET SQL_NOTES=@OLD_SQL_NOTES */;\n\n",
        );
        out
    }

    fn setup_transaction(&self) -> String {
        "SET SESSION TRANSACTION ISOLATION LEVEL REPEATABLE READ".to_string()
    }

    fn start_transaction(&self) -> String {
        "START TRANSACTION /*!40100 WITH CONSISTENT SNAPSHOT */".to_string()
    }

    fn commit_transaction(&self) -> String {
        "COMMIT".to_string()
    }

    fn lock_table(&self, table: &str) -> String {
        format!("LOCK TABLES {} READ LOCAL", self.quote_identifier(table))
    }

    fn unlock_table(&self, _table: &str) -> String {
        "UNLOCK TABLES".to_string()
    }

    fn start_add_lock_table(&self, table: &str) -> String {
        format!("LOCK TABLES {} WRITE;\n", self.quote_identifier(table))
    }

    fn end_add_lock_table(&self, _table: &str) -> String {
        "UNLOCK TABLES;\n".to_string()
    }

    fn start_disable_keys(&self, table: &str) -> String {
        format!(
            "/*!40000 ALTER TABLE {} DISABLE KEYS */;\n",
            self.quote_identifier(table)
        )
    }

    fn end_disable_keys(&self, table: &str) -> String {
        format!(
            "/*!40000 ALTER TABLE {} ENABLE KEYS */;\n",
            self.quote_identifier(table)
        )
    }

    fn start_disable_autocommit(&self) -> String {
        "SET autocommit=0;\n".to_string()
    }

    fn end_disable_autocommit(&self) -> String {
        "COMMIT;\n".to_string()
    }

    fn parse_column_type(&self, row: &Row) -> Result<ColumnType> {
        let name = required(row, "Field", "column")?;
        let type_sql = required(row, "Type", "column")?;
        let extra = row.value("Extra").unwrap_or_default();
        Ok(classify_mysql_column(name, type_sql, extra))
    }

    fn select_hex(&self, column: &str) -> String {
        let column = self.quote_identifier(column);
        format!("HEX({column}) AS {column}")
    }

    fn select_hex_bit(&self, column: &str) -> String {
        let column = self.quote_identifier(column);
        format!("LPAD(HEX({column}),2,'0') AS {column}")
    }
}
