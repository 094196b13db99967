//! 集成测试公共模块

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// 创建测试用的日志文件
#[allow(dead_code)]
pub fn create_test_log(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// 标准测试日志内容：一条多行 SELECT 和一条 INSERT，中间夹着应用自己的日志
#[allow(dead_code)]
pub const SAMPLE_ENGINE_LOG: &str = "\
2024-01-15 10:30:00,120 INFO sqlalchemy.engine.Engine BEGIN (implicit)
2024-01-15 10:30:00,123 INFO sqlalchemy.engine.Engine SELECT users.id, users.name
FROM users
WHERE users.id = ? AND users.status = ?
2024-01-15 10:30:00,124 INFO sqlalchemy.engine.Engine [generated in 0.00015s] (1, 'active')
2024-01-15 10:30:00,125 INFO myapp.views rendering user page
2024-01-15 10:30:00,126 INFO sqlalchemy.engine.Engine INSERT INTO audit (user_id, note) VALUES (?, ?)
2024-01-15 10:30:00,127 INFO sqlalchemy.engine.Engine [cached since 12.5s ago] (1, 'viewed')
2024-01-15 10:30:00,128 INFO sqlalchemy.engine.Engine COMMIT
";

/// PostgreSQL 驱动风格（pyformat 占位符、字典参数）的日志
#[allow(dead_code)]
pub const PYFORMAT_ENGINE_LOG: &str = "\
2024-01-15 10:30:00,123 INFO sqlalchemy.engine.Engine UPDATE accounts SET balance=%(balance)s WHERE accounts.id = %(id_1)s
2024-01-15 10:30:00,124 INFO sqlalchemy.engine.Engine [generated in 0.00020s] {'balance': 99.5, 'id_1': 7}
";
