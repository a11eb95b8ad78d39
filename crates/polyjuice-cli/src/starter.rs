//! Starter schema document written by `polyjuice init`.

use std::fs;
use std::path::Path;

use polyjuice::{PolyjuiceError, Result};

/// Schema document showing every supported construct.
pub const STARTER_SCHEMA: &str = r#"# polyjuice schema document
#
# Tables describe the source schema; models name the Django classes to build
# from them. Column options carry a dialect prefix (django_*).

render:
  app_label: hogwarts
  header: true

tables:
  - name: hogwarts__house
    columns:
      - name: id
        type: Integer
        primary_key: true
      - name: name
        type: String
        length: 30
        nullable: false
        unique: true
        options:
          django_help_text: Name of the house
      - name: founded
        type: Date
        default: {callable: datetime.date.today}
    indexes:
      - name: ix_house_name
        expressions: ["name.desc()"]

  - name: hogwarts__wizard
    columns:
      - name: id
        type: BigInteger
        primary_key: true
      - name: name
        type: Unicode
        length: 50
        nullable: false
      - name: house_id
        type: Integer
        foreign_key: hogwarts__house.id
        options:
          django_on_delete: CASCADE
          django_related_name: wizards
          django_field_name: house
      - name: galleons
        type: Numeric
        precision: 10
        scale: 2
        default: 0
      - name: is_prefect
        type: Boolean
        nullable: false
        default: false
      - name: created
        type: DateTime
        options:
          django_auto_now_add: true

models:
  - name: House
    table: hogwarts__house
    meta:
      ordering: [name]
    methods:
      - name: __str__
        source: |
          def __str__(self):
              return self.name

  - name: Wizard
    table: hogwarts__wizard
"#;

/// Write the starter schema to `path`.
///
/// An existing file is only replaced when `force` is set.
pub fn write_starter(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(PolyjuiceError::config(format!(
            "File already exists: {} (use --force to overwrite)",
            path.display()
        )));
    }
    fs::write(path, STARTER_SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyjuice::{model, Config};

    #[test]
    fn test_starter_schema_translates() {
        polyjuice::init();
        let config = Config::from_yaml(STARTER_SCHEMA).unwrap();
        let models: Vec<_> = config
            .placeholders()
            .unwrap()
            .iter()
            .map(|p| model(p).unwrap())
            .collect();
        assert_eq!(models.len(), 2);
        assert!(models[1].field("house").is_some());
    }

    #[test]
    fn test_write_starter_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");

        write_starter(&path, false).unwrap();
        assert!(write_starter(&path, false).is_err());
        write_starter(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_SCHEMA);
    }
}
