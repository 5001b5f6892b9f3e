//! End-to-end auto-wiring demo: interface binding, singleton lifecycle,
//! factory bindings, and method injection through `call`.
//!
//! Run with: cargo run --example autowire

use bindery::prelude::*;
use bindery::value;

struct Config {
    url: String,
}

struct Database {
    config: Arc<Config>,
}

struct ReportJob;

fn main() -> Result<()> {
    let types = TypeRegistry::new();

    types.insert(TypeInfo::interface("Store"));

    types.define(TypeDef::<Config>::new("Config").constructor(
        vec![ParamSpec::with_default(
            "url",
            "postgres://localhost".to_string(),
        )],
        |args| {
            Ok(Config {
                url: value::arg::<String>(args, 0)?.as_ref().clone(),
            })
        },
    ));

    types.define(TypeDef::<Database>::new("Database").constructor(
        vec![ParamSpec::of_type("config", "Config")],
        |args| {
            Ok(Database {
                config: value::arg::<Config>(args, 0)?,
            })
        },
    ));

    types.define(
        TypeDef::<ReportJob>::new("ReportJob")
            .nullary(|| ReportJob)
            .method(
                "run",
                vec![
                    ParamSpec::of_type("store", "Store"),
                    ParamSpec::with_default("limit", 10i64),
                ],
                |_, args| {
                    let db = value::arg::<Database>(args, 0)?;
                    let limit = value::arg::<i64>(args, 1)?;
                    Ok(value::erase(format!(
                        "report of {limit} rows from {}",
                        db.config.url
                    )))
                },
            ),
    );

    let container = Container::with_reflector(Arc::new(types));

    // The abstract "Store" key resolves to a shared Database.
    container.singleton("Store", "Database");
    container.singleton_self("Config");

    // A factory binding with access to the container and caller overrides.
    container.bind_factory("ConnString", |c, _| {
        let config = c.get_as::<Config>("Config")?;
        Ok(format!("dsn={}", config.url))
    });

    let store = container.get_as::<Database>("Store")?;
    println!("store backed by {}", store.config.url);

    let dsn = container.get_as::<String>("ConnString")?;
    println!("{dsn}");

    // Method injection: "store" auto-wires to the singleton, "limit"
    // comes from the override.
    let report = container.call_with(
        "ReportJob",
        "run",
        &Params::new().with("limit", 3i64),
    )?;
    println!("{}", value::downcast::<String>(report)?);

    Ok(())
}
