// ============================================================================
// 数据传输对象（DTO）定义
// 查询与统计结果的数据结构，仅包含字段定义、序列化派生和简单派生值
// ⛔ 禁止：包含复杂的业务逻辑方法
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::entities::{Project, TestCase, TestStatus};

/// 带统计信息的项目，由 `get_projects_with_stats` 返回
///
/// 序列化时项目字段被展开到同一层级。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithStats {
    #[serde(flatten)]
    pub project: Project,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// 持久化数据中恒为 0，为草稿等瞬时状态保留
    pub pending_tests: usize,
}

impl ProjectWithStats {
    /// 项目通过率（百分比），没有用例时为 0
    pub fn pass_percentage(&self) -> f64 {
        if self.total_tests == 0 {
            0.0
        } else {
            self.passed_tests as f64 / self.total_tests as f64 * 100.0
        }
    }
}

/// 仪表盘汇总统计
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: usize,
    pub total_test_cases: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    pub total_pending: usize,
    /// 通过率百分比，没有用例时为 0
    pub pass_rate: f64,
}

/// 用例列表的状态筛选项
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pass,
    Fail,
}

impl StatusFilter {
    pub fn matches(&self, status: TestStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pass => status == TestStatus::Pass,
            StatusFilter::Fail => status == TestStatus::Fail,
        }
    }
}

/// 用例列表筛选条件
///
/// `search` 对名称和描述做不区分大小写的子串匹配，空串匹配全部。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl TestCaseFilter {
    pub fn matches(&self, test_case: &TestCase) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = test_case.name.to_lowercase().contains(&needle)
            || test_case.description.to_lowercase().contains(&needle);
        matches_search && self.status.matches(test_case.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: "p1".to_string(),
            name: "Parser".to_string(),
            description: "parser checks".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_project_with_stats_flattens_project_fields() {
        let stats = ProjectWithStats {
            project: project(),
            total_tests: 3,
            passed_tests: 2,
            failed_tests: 1,
            pending_tests: 0,
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["id"], "p1");
        assert_eq!(value["name"], "Parser");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(value["totalTests"], 3);
        assert_eq!(value["passedTests"], 2);
        assert_eq!(value["failedTests"], 1);
        assert_eq!(value["pendingTests"], 0);
    }

    #[test]
    fn test_pass_percentage() {
        let mut stats = ProjectWithStats {
            project: project(),
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            pending_tests: 0,
        };
        assert_eq!(stats.pass_percentage(), 0.0);

        stats.total_tests = 4;
        stats.passed_tests = 3;
        stats.failed_tests = 1;
        assert_eq!(stats.pass_percentage(), 75.0);
    }

    #[test]
    fn test_status_filter_matches() {
        assert!(StatusFilter::All.matches(TestStatus::Pass));
        assert!(StatusFilter::All.matches(TestStatus::Fail));
        assert!(StatusFilter::Pass.matches(TestStatus::Pass));
        assert!(!StatusFilter::Pass.matches(TestStatus::Fail));
        assert!(StatusFilter::Fail.matches(TestStatus::Fail));
        assert!(!StatusFilter::Fail.matches(TestStatus::Pending));
    }

    #[test]
    fn test_status_filter_deserializes_lowercase() {
        let filter: TestCaseFilter =
            serde_json::from_str(r#"{"search":"x","status":"fail"}"#).unwrap();
        assert_eq!(filter.status, StatusFilter::Fail);
    }
}
