//! 服务自带的数据库迁移

use sillon_adapter_postgres::Migration;

pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "init_sales_orders",
        include_str!("../../../migrations/0001_init.sql"),
    )]
}
