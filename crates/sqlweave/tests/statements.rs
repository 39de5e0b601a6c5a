use sqlweave::{
    Builder, Dialect, FieldRef, Join, JoinKind, Operand, PlaceholderStyle, SqlError, Value, Where,
};

fn numbered() -> Dialect {
    Dialect::generic().with_placeholder(PlaceholderStyle::Numbered)
}

/// `$n` placeholder indexes in textual order.
fn numbered_tokens(sql: &str) -> Vec<usize> {
    let mut tokens = Vec::new();
    let mut chars = sql.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch != '$' {
            continue;
        }
        let mut end = idx + 1;
        while let Some(&(next, c)) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            end = next + c.len_utf8();
            chars.next();
        }
        if let Ok(n) = sql[idx + 1..end].parse() {
            tokens.push(n);
        }
    }
    tokens
}

#[test]
fn where_and_chain() {
    let (sql, params) = Where::new("kind")
        .equals("image")
        .and("category_id")
        .equals(15)
        .build()
        .unwrap()
        .into_parts();
    assert_eq!(sql, "kind = ? AND category_id = ?");
    assert_eq!(params, vec![Value::from("image"), Value::Int(15)]);
}

#[test]
fn where_in_list() {
    let (sql, params) = Where::new("id").is_in(vec![1, 2, 3]).build().unwrap().into_parts();
    assert_eq!(sql, "id IN (?, ?, ?)");
    assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn where_between() {
    let (sql, params) = Where::new("id").between(10, 20).build().unwrap().into_parts();
    assert_eq!(sql, "id BETWEEN ? AND ?");
    assert_eq!(params, vec![Value::Int(10), Value::Int(20)]);
}

#[test]
fn select_with_join() {
    let (sql, params) = Builder::new()
        .select(["id", "name"])
        .from("a")
        .join(Join::new("b", JoinKind::Inner).on(Where::new("refid").equals(Operand::field("id"))))
        .render()
        .unwrap()
        .into_parts();
    assert_eq!(sql, "SELECT a.id, a.name FROM a INNER JOIN b ON (b.refid = a.id)");
    assert!(params.is_empty());
}

#[test]
fn update_with_field_assignment() {
    let (sql, params) = Builder::new()
        .update("t")
        .set_all([("a", FieldRef::new("b"))])
        .render()
        .unwrap()
        .into_parts();
    assert_eq!(sql, "UPDATE t SET a = b");
    assert!(params.is_empty());
}

#[test]
fn field_only_where_binds_nothing() {
    let w = Where::new("a")
        .equals(Operand::field("b"))
        .or("c")
        .gt(Operand::aliased_field("d", "x"))
        .and("e")
        .is_in(Operand::list([Operand::field("f"), Operand::field("g")]));
    let rendered = w.build().unwrap();
    assert!(rendered.params.is_empty());
    assert!(!rendered.sql.contains('?'));
}

#[test]
fn left_join_with_multiple_tables() {
    let builder = Builder::new()
        .select(["id", "b.label", "c.size"])
        .from(("items", "a"))
        .join(Join::left(
            ("labels", "b"),
            Where::new("item_id").equals(Operand::field("id")),
        ))
        .join(Join::left(
            ("sizes", "c"),
            Where::new("item_id")
                .equals(Operand::field("id"))
                .and("unit")
                .equals("cm"),
        ))
        .filter(Where::aliased("kind", "b").equals("x"));
    let (sql, params) = builder.render().unwrap().into_parts();
    assert_eq!(
        sql,
        "SELECT a.id, b.label, c.size FROM items a \
         LEFT JOIN labels b ON (b.item_id = a.id) \
         LEFT JOIN sizes c ON (c.item_id = a.id AND c.unit = ?) \
         WHERE b.kind = ?"
    );
    assert_eq!(params, vec![Value::from("cm"), Value::from("x")]);
}

#[test]
fn explicit_table_name_resolves_to_alias() {
    let builder = Builder::new()
        .select_all()
        .from(("languages", "l"))
        .filter(Where::aliased("code", "languages").equals("de"));
    assert_eq!(
        builder.render().unwrap().sql,
        "SELECT * FROM languages l WHERE l.code = ?"
    );
}

#[test]
fn numbered_placeholders_follow_textual_order() {
    let inner = Builder::new()
        .select(["id"])
        .from("tags")
        .filter(Where::new("name").is_in(vec!["a", "b"]));
    let exists = Builder::new()
        .select(["1"])
        .from("flags")
        .filter(Where::new("on").equals(true));
    let builder = Builder::with_dialect(numbered())
        .select(["id"])
        .from("posts")
        .filter(Where::new("author").equals("x"))
        .filter(Where::new("tag_id").is_in(inner))
        .filter(Where::empty().exists(exists))
        .union_all(Builder::new().select(["id"]).from("drafts").filter(Where::new("n").lt(3)));

    let rendered = builder.render().unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT posts.id FROM posts WHERE posts.author = $1 \
         AND posts.tag_id IN (SELECT tags.id FROM tags WHERE tags.name IN ($2, $3)) \
         AND EXISTS (SELECT 1 FROM flags WHERE flags.on = $4) \
         UNION ALL SELECT drafts.id FROM drafts WHERE drafts.n < $5"
    );
    assert_eq!(numbered_tokens(&rendered.sql), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        rendered.params.as_slice(),
        &[
            Value::from("x"),
            Value::from("a"),
            Value::from("b"),
            Value::Bool(true),
            Value::Int(3),
        ]
    );
}

#[test]
fn render_twice_is_identical() {
    let builder = Builder::with_dialect(numbered())
        .with("recent")
        .as_(
            Builder::new()
                .select(["id"])
                .from("posts")
                .filter(Where::new("age").lt(7)),
            None,
        )
        .select(["id"])
        .from("recent")
        .order(["id"])
        .limit(10);
    let first = builder.render().unwrap();
    let second = builder.render().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.sql,
        "WITH recent AS (SELECT posts.id FROM posts WHERE posts.age < $1) \
         SELECT recent.id FROM recent ORDER BY recent.id LIMIT 10"
    );
}

#[test]
fn postgres_dialect_quotes_reserved_identifiers() {
    let builder = Builder::with_dialect(Dialect::postgres())
        .select_all()
        .from(("orders", "o"))
        .filter(Where::new("unit price").gt(5));
    assert_eq!(
        builder.render().unwrap().sql,
        r#"SELECT * FROM orders o WHERE "o"."unit price" > %s"#
    );

    let insert = Builder::with_dialect(Dialect::postgres())
        .insert_into("order items")
        .value("qty", 2);
    assert_eq!(
        insert.render().unwrap().sql,
        r#"INSERT INTO "order items" (qty) VALUES (%s)"#
    );
}

#[test]
fn errors_are_reported_not_rendered() {
    let dangling = Builder::new()
        .select_all()
        .from("t")
        .filter(Where::new("a").equals(1).and("b"));
    assert!(dangling.render().unwrap_err().is_missing_operand());

    let conflict = Builder::new()
        .select_all()
        .from(("t", "x"))
        .join(Join::inner(("u", "x"), Where::new("a").is_null()));
    assert_eq!(
        conflict.render().unwrap_err(),
        SqlError::DuplicateAlias {
            alias: "x".into(),
            existing: "t".into(),
            table: "u".into(),
        }
    );

    let join_without_on = Builder::new()
        .select_all()
        .from("t")
        .join(Join::new("u", JoinKind::Left));
    assert!(join_without_on.render().unwrap_err().is_missing_operand());

    for qualifier in [Where::new("refid"), Where::empty()] {
        let empty_on = Builder::new()
            .select_all()
            .from("a")
            .join(Join::inner("b", qualifier));
        assert!(empty_on.render().unwrap_err().is_missing_operand());
    }
}

#[test]
fn dialect_from_toml() {
    let dialect = Dialect::from_toml_str(
        r#"
        preset = "postgres"
        placeholder = "numbered"
        "#,
    )
    .unwrap();
    let rendered = Builder::with_dialect(dialect)
        .delete_from("sessions")
        .filter(Where::new("expired").equals(true).or("user_id").is_null())
        .render()
        .unwrap();
    assert_eq!(rendered.sql, "DELETE FROM sessions WHERE expired = $1 OR user_id IS NULL");
    assert_eq!(rendered.params.as_slice(), &[Value::Bool(true)]);

    let err = Dialect::from_toml_str("field_quote = \"'\"").unwrap_err();
    assert!(err.is_configuration());
}
