//! Unit tests for the MySQL dump adapter.
//!
//! These tests verify the MySQL adapter functionality including:
//! - Column type classification from `SHOW COLUMNS` rows
//! - SHOW CREATE post-processing for tables and routines
//! - Session wrappers and stand-in tables

use crate::adapters::{AdapterFeature, DumpAdapter};
use crate::models::{ObjectKind, Row, TableColumns};
use crate::settings::Settings;
use serde_json::json;

use super::MySqlDumpAdapter;
use super::type_mapping::{classify_mysql_column, is_generated, type_tag};

fn adapter_with(raw: serde_json::Value) -> MySqlDumpAdapter {
    let settings = Settings::new(raw.as_object().cloned().unwrap_or_default()).unwrap();
    MySqlDumpAdapter::new(&settings)
}

fn adapter() -> MySqlDumpAdapter {
    adapter_with(json!({}))
}

fn column_row(field: &str, type_sql: &str, extra: &str) -> Row {
    Row::new()
        .with("Field", field)
        .with("Type", type_sql)
        .with("Null", "YES")
        .with("Key", "")
        .with_null("Default")
        .with("Extra", extra)
}

// =============================================================================
// Type Classification Tests
// =============================================================================

#[test]
fn test_type_tag_strips_length_and_attributes() {
    assert_eq!(type_tag("int(10) unsigned"), "int");
    assert_eq!(type_tag("varchar(255)"), "varchar");
    assert_eq!(type_tag("enum('a','b c')"), "enum");
    assert_eq!(type_tag("double"), "double");
    assert_eq!(type_tag("BIT(1)"), "bit");
}

#[test]
fn test_numeric_columns() {
    for type_sql in ["int(11)", "bigint unsigned", "decimal(10,2)", "float", "tinyint(1)"] {
        let column = classify_mysql_column("n", type_sql, "");
        assert!(column.is_numeric, "{} should be numeric", type_sql);
        assert!(!column.is_blob, "{} should not be blob", type_sql);
    }
}

#[test]
fn test_blob_columns() {
    for type_sql in ["blob", "longblob", "varbinary(16)", "geometry", "point"] {
        let column = classify_mysql_column("b", type_sql, "");
        assert!(column.is_blob, "{} should be blob", type_sql);
        assert!(!column.is_numeric, "{} should not be numeric", type_sql);
    }
}

#[test]
fn test_bit_is_numeric_and_blob() {
    let column = classify_mysql_column("flags", "bit(8)", "");
    assert!(column.is_numeric);
    assert!(column.is_blob);
    assert_eq!(column.type_tag, "bit");
    assert_eq!(column.type_sql, "bit(8)");
}

#[test]
fn test_text_columns_are_quoted() {
    let column = classify_mysql_column("name", "varchar(64)", "");
    assert!(!column.is_numeric);
    assert!(!column.is_blob);
    assert!(!column.is_virtual);
}

#[test]
fn test_generated_columns() {
    assert!(is_generated("VIRTUAL GENERATED"));
    assert!(is_generated("STORED GENERATED"));
    assert!(is_generated("stored generated"));
    assert!(!is_generated("auto_increment"));
    assert!(!is_generated("DEFAULT_GENERATED"));
}

#[test]
fn test_parse_column_type_from_row() {
    let adapter = adapter();
    let column = adapter
        .parse_column_type(&column_row("total", "int(11)", "VIRTUAL GENERATED"))
        .unwrap();
    assert_eq!(column.name, "total");
    assert!(column.is_virtual);

    let incomplete = Row::new().with("Field", "x");
    assert!(adapter.parse_column_type(&incomplete).is_err());
}

// =============================================================================
// Introspection Query Tests
// =============================================================================

#[test]
fn test_listing_queries() {
    let adapter = adapter();
    let tables = adapter.list_objects(ObjectKind::Table, "shop");
    assert!(tables.contains("TABLE_TYPE='BASE TABLE'"));
    assert!(tables.contains("TABLE_SCHEMA='shop'"));

    let views = adapter.list_objects(ObjectKind::View, "o'brien");
    assert!(views.contains("TABLE_SCHEMA='o\\'brien'"));

    assert_eq!(
        adapter.list_objects(ObjectKind::Trigger, "shop"),
        "SHOW TRIGGERS FROM `shop`;"
    );
    assert!(
        adapter
            .list_objects(ObjectKind::Function, "shop")
            .contains("ROUTINE_TYPE='FUNCTION'")
    );
}

#[test]
fn test_trigger_name_comes_from_trigger_column() {
    let adapter = adapter();
    let row = Row::new().with("Trigger", "audit_insert").with("Event", "INSERT");
    assert_eq!(adapter.listed_name(ObjectKind::Trigger, &row), Some("audit_insert"));
    let table_row = Row::new().with("tbl_name", "users");
    assert_eq!(adapter.listed_name(ObjectKind::Table, &table_row), Some("users"));
}

#[test]
fn test_identifier_quoting() {
    let adapter = adapter();
    assert_eq!(adapter.quote_identifier("users"), "`users`");
    assert_eq!(adapter.quote_identifier("we`ird"), "`we``ird`");
    assert_eq!(adapter.show_columns("users"), "SHOW COLUMNS FROM `users`;");
    assert_eq!(
        adapter.show_create(ObjectKind::Event, "nightly"),
        "SHOW CREATE EVENT `nightly`"
    );
}

// =============================================================================
// DDL Builder Tests
// =============================================================================

const CREATE_USERS: &str = "CREATE TABLE `users` (\n  `id` int NOT NULL AUTO_INCREMENT,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB AUTO_INCREMENT=3 DEFAULT CHARSET=utf8mb4";

#[test]
fn test_create_table_wraps_charset() {
    let row = Row::new().with("Table", "users").with("Create Table", CREATE_USERS);
    let ddl = adapter().create_table(&row).unwrap();
    assert!(ddl.starts_with("/*!40101 SET @saved_cs_client     = @@character_set_client */;\n"));
    assert!(ddl.contains("SET character_set_client = utf8 */;\n"));
    assert!(ddl.contains(&format!("{};\n", CREATE_USERS)));
    assert!(ddl.ends_with("@saved_cs_client */;\n\n"));
}

#[test]
fn test_create_table_options() {
    let row = Row::new().with("Table", "users").with("Create Table", CREATE_USERS);
    let ddl = adapter_with(json!({ "reset-auto-increment": true, "if-not-exists": true }))
        .create_table(&row)
        .unwrap();
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS `users`"));
    assert!(!ddl.contains("AUTO_INCREMENT=3"));
    assert!(ddl.contains("NOT NULL AUTO_INCREMENT,"));
}

#[test]
fn test_create_table_requires_definition() {
    let row = Row::new().with("Table", "users");
    let err = adapter().create_table(&row).unwrap_err();
    assert!(err.to_string().contains("Create Table"));
}

#[test]
fn test_create_procedure_skip_definer() {
    let row = Row::new()
        .with("Procedure", "cleanup")
        .with("Create Procedure", "CREATE DEFINER=`root`@`%` PROCEDURE `cleanup`()\nBEGIN\nDELETE FROM t;\nEND");
    let kept = adapter().create_procedure(&row).unwrap();
    assert!(kept.contains("DEFINER=`root`@`%`"));
    assert!(kept.contains("DELIMITER ;;\n"));

    let stripped = adapter_with(json!({ "skip-definer": true }))
        .create_procedure(&row)
        .unwrap();
    assert!(stripped.contains("CREATE PROCEDURE `cleanup`()"));
    assert!(!stripped.contains("DEFINER"));
}

#[test]
fn test_create_function_uses_row_session_values() {
    let row = Row::new()
        .with("Function", "total")
        .with("sql_mode", "STRICT_TRANS_TABLES")
        .with("Create Function", "CREATE FUNCTION `total`() RETURNS int RETURN 1")
        .with("character_set_client", "utf8mb4")
        .with("collation_connection", "utf8mb4_general_ci");
    let ddl = adapter().create_function(&row).unwrap();
    assert!(ddl.contains("SET character_set_client = utf8mb4 */;"));
    assert!(ddl.contains("SET collation_connection  = utf8mb4_general_ci */ ;"));
    assert!(ddl.contains("SET sql_mode              = 'STRICT_TRANS_TABLES' */ ;"));
    assert!(ddl.contains("CREATE FUNCTION `total`() RETURNS int RETURN 1 ;;\n"));
}

#[test]
fn test_create_event_and_trigger() {
    let event = Row::new()
        .with("Event", "nightly")
        .with("sql_mode", "")
        .with("Create Event", "CREATE DEFINER=`root`@`localhost` EVENT `nightly` ON SCHEDULE EVERY 1 DAY DO DELETE FROM t");
    let ddl = adapter().create_event(&event).unwrap();
    assert!(ddl.contains("/*!50106 CREATE*/ /*!50117 DEFINER=`root`@`localhost`*/ /*!50106 EVENT `nightly`"));
    assert!(ddl.ends_with("/*!50106 SET TIME_ZONE= @save_time_zone */ ;\n\n"));

    let trigger = Row::new().with(
        "SQL Original Statement",
        "CREATE DEFINER=`root`@`localhost` TRIGGER `t_ai` AFTER INSERT ON `t` FOR EACH ROW SET @x = 1",
    );
    let ddl = adapter_with(json!({ "skip-definer": true }))
        .create_trigger(&trigger)
        .unwrap();
    assert_eq!(
        ddl,
        "DELIMITER ;;\n/*!50003 CREATE*/ /*!50003 TRIGGER `t_ai` AFTER INSERT ON `t` FOR EACH ROW SET @x = 1 */;;\nDELIMITER ;\n\n"
    );
}

#[test]
fn test_stand_in_table_lists_raw_types() {
    let columns: TableColumns = [
        classify_mysql_column("id", "int(11)", ""),
        classify_mysql_column("label", "varchar(32)", ""),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        adapter().create_stand_in_table("v_users", &columns),
        "CREATE TABLE IF NOT EXISTS `v_users` (\n`id` int(11)\n,`label` varchar(32)\n);\n"
    );
}

#[test]
fn test_create_database() {
    let defaults = Row::new()
        .with("character_set_database", "utf8mb4")
        .with("collation_database", "utf8mb4_0900_ai_ci");
    let ddl = adapter().create_database("shop", &defaults);
    assert_eq!(
        ddl,
        "CREATE DATABASE /*!32312 IF NOT EXISTS*/ `shop` /*!40100 DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_ai_ci */;\n\nUSE `shop`;\n\n"
    );
    assert_eq!(
        adapter().database_header("shop"),
        "--\n-- Current Database: `shop`\n--\n\n"
    );
}

// =============================================================================
// Session Parameter and Wrapper Tests
// =============================================================================

#[test]
fn test_backup_and_restore_parameters() {
    let default = adapter();
    let backup = default.backup_parameters();
    assert!(backup.contains("/*!40101 SET NAMES utf8 */;\n"));
    assert!(backup.contains("SET TIME_ZONE='+00:00'"));
    assert!(!backup.contains("OLD_AUTOCOMMIT"));
    assert!(default.restore_parameters().contains("SET TIME_ZONE=@OLD_TIME_ZONE"));

    let tuned = adapter_with(json!({ "skip-tz-utc": true, "no-autocommit": true }));
    assert!(!tuned.backup_parameters().contains("TIME_ZONE"));
    assert!(tuned.backup_parameters().contains("@OLD_AUTOCOMMIT=@@AUTOCOMMIT"));
    assert!(tuned.restore_parameters().contains("SET AUTOCOMMIT=@OLD_AUTOCOMMIT"));
    assert!(!tuned.restore_parameters().contains("TIME_ZONE"));
}

#[test]
fn test_row_wrappers() {
    let adapter = adapter();
    assert_eq!(adapter.start_add_lock_table("t"), "LOCK TABLES `t` WRITE;\n");
    assert_eq!(adapter.end_add_lock_table("t"), "UNLOCK TABLES;\n");
    assert_eq!(
        adapter.start_disable_keys("t"),
        "/*!40000 ALTER TABLE `t` DISABLE KEYS */;\n"
    );
    assert_eq!(
        adapter.end_disable_keys("t"),
        "/*!40000 ALTER TABLE `t` ENABLE KEYS */;\n"
    );
    assert_eq!(adapter.start_disable_autocommit(), "SET autocommit=0;\n");
    assert_eq!(adapter.end_disable_autocommit(), "COMMIT;\n");
    assert_eq!(adapter.lock_table("t"), "LOCK TABLES `t` READ LOCAL");
    assert_eq!(adapter.unlock_table("t"), "UNLOCK TABLES");
}

#[test]
fn test_hex_selection() {
    let adapter = adapter();
    assert_eq!(adapter.select_hex("data"), "HEX(`data`) AS `data`");
    assert_eq!(adapter.select_hex_bit("flags"), "LPAD(HEX(`flags`),2,'0') AS `flags`");
}

#[test]
fn test_feature_support() {
    let adapter = adapter();
    assert_eq!(adapter.dialect(), "mysql");
    assert!(adapter.supports_feature(AdapterFeature::SchemaIntrospection));
    assert!(adapter.supports_feature(AdapterFeature::ConsistentSnapshot));
    assert!(adapter.supports_feature(AdapterFeature::HexBlob));
}
