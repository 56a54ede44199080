pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_detectives.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_detectives.sql")),
				"tables/002_services.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_services.sql")),
				"tables/003_reviews.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_reviews.sql")),
				"tables/004_detective_visibility.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_detective_visibility.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use crate::schema::render_schema;

	#[test]
	fn render_expands_every_include() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS detectives"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS services"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS reviews"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS detective_visibility"));
	}
}
