use serde::{Deserialize, Deserializer};
use sqlx::{Encode, Postgres, QueryBuilder, Type};

/// 部分更新字段：缺省、显式 null、给定值三态
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_present(&self) -> bool {
        !matches!(self, Patch::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

/// `UPDATE <table> SET ...` 构造器，只写入出现的字段
pub struct UpdateSet<'args> {
    builder: QueryBuilder<'args, Postgres>,
    fields: usize,
    touch: Option<&'static str>,
}

impl<'args> UpdateSet<'args> {
    pub fn new(table: &'static str) -> Self {
        Self {
            builder: QueryBuilder::new(format!("UPDATE {} SET ", table)),
            fields: 0,
            touch: None,
        }
    }

    /// 有字段写入时同时刷新该时间戳列
    pub fn touch(mut self, column: &'static str) -> Self {
        self.touch = Some(column);
        self
    }

    pub fn set<T>(&mut self, column: &'static str, patch: Patch<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        match patch {
            Patch::Absent => {}
            Patch::Null => {
                self.push_column(column);
                self.builder.push_bind(None::<T>);
            }
            Patch::Value(v) => {
                self.push_column(column);
                self.builder.push_bind(v);
            }
        }
        self
    }

    fn push_column(&mut self, column: &str) {
        if self.fields > 0 {
            self.builder.push(", ");
        }
        self.builder.push(column).push(" = ");
        self.fields += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.fields == 0
    }

    /// 没有任何字段时返回 None，调用方不发出语句
    pub fn into_query(mut self, id: i64) -> Option<QueryBuilder<'args, Postgres>> {
        if self.fields == 0 {
            return None;
        }
        if let Some(column) = self.touch {
            self.builder.push(", ").push(column).push(" = NOW()");
        }
        self.builder.push(" WHERE id = ").push_bind(id);
        Some(self.builder)
    }
}

/// `WHERE 1=1 AND col = ?` 形式的等值过滤
pub struct Filter<'args> {
    builder: QueryBuilder<'args, Postgres>,
}

impl<'args> Filter<'args> {
    pub fn new(select: &str) -> Self {
        let mut builder = QueryBuilder::new(select);
        builder.push(" WHERE 1=1");
        Self { builder }
    }

    pub fn eq<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(v) = value {
            self.builder.push(" AND ").push(column).push(" = ").push_bind(v);
        }
        self
    }

    /// 子串匹配（不区分大小写）
    pub fn contains(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.builder
                .push(" AND ")
                .push(column)
                .push(" ILIKE ")
                .push_bind(like_pattern(v));
        }
        self
    }

    pub fn finish(mut self, tail: &str) -> QueryBuilder<'args, Postgres> {
        if !tail.is_empty() {
            self.builder.push(" ").push(tail);
        }
        self.builder
    }
}

/// 关键词转为 `%kw%`，转义通配符
pub fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
