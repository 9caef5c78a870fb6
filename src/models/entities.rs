// ============================================================================
// 实体定义：Project / TestCase
// 序列化字段名与持久化格式一致（camelCase），时间戳为 RFC 3339 字符串
// ============================================================================

use serde::{Deserialize, Serialize};

/// 测试状态
///
/// `Pass` / `Fail` 由期望输出与实际输出比较得出；
/// `Pending` 只用于展示层尚未保存的草稿，Store 永远不会写入。
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Pending,
}

impl TestStatus {
    /// 状态推导规则：逐字节精确比较，区分大小写与空白，不做任何规范化
    pub fn derive(expected_output: &str, actual_output: &str) -> Self {
        if expected_output == actual_output {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Pending => "pending",
        }
    }
}

/// 项目：一组相关测试用例的容器
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

/// 测试用例
///
/// `status` 是派生字段，外部无法直接设置：只能通过 Store 的创建/更新路径
/// 或反序列化获得 TestCase，Store 在这些路径上都会重新推导状态。
/// 调用方修改输出字段后拿到的副本，其 `status()` 仍是上一次推导的结果，
/// 直到交给 `Store::update_test_case`。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub actual_output: String,
    status: TestStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl TestCase {
    /// 由创建载荷构造新用例，created_at 与 updated_at 相同
    pub(crate) fn from_new(id: String, data: NewTestCase, now: String) -> Self {
        let status = TestStatus::derive(&data.expected_output, &data.actual_output);
        TestCase {
            id,
            project_id: data.project_id,
            name: data.name,
            description: data.description,
            expected_output: data.expected_output,
            actual_output: data.actual_output,
            status,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn status(&self) -> TestStatus {
        self.status
    }

    /// 按当前输出重新推导状态
    pub(crate) fn rederive_status(&mut self) {
        self.status = TestStatus::derive(&self.expected_output, &self.actual_output);
    }
}

/// 创建测试用例的载荷：不含 id、状态和时间戳
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTestCase {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub actual_output: String,
}

impl NewTestCase {
    /// 表单草稿的状态预览
    ///
    /// 任一输出为空时草稿尚不可比较，返回 `Pending`；否则按推导规则返回。
    pub fn preview_status(&self) -> TestStatus {
        if self.expected_output.is_empty() || self.actual_output.is_empty() {
            TestStatus::Pending
        } else {
            TestStatus::derive(&self.expected_output, &self.actual_output)
        }
    }
}
