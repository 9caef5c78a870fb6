// ============================================================================
// Store：项目与测试用例的唯一权威持有者
// ============================================================================
//
// 所有变更都遵循“先持久化、后提交”：先构造新集合并保存，保存成功后才替换
// 内存中的集合。持久化失败时返回错误，内存状态保持不变。
// Store 不校验名称是否为空，也不校验 projectId 是否存在，这些由调用方负责。

use crate::models::dtos::{DashboardStats, ProjectWithStats, TestCaseFilter};
use crate::models::entities::{NewTestCase, Project, TestCase};
use crate::services::persistence::{
    encode_collection, load_collection, save_collection, KvStore, PROJECTS_KEY, TEST_CASES_KEY,
};
use crate::services::stats;
use crate::utils::clock::{format_timestamp, strictly_after, Clock, SystemClock};
use crate::utils::error::{AppError, AppResult};
use crate::utils::id::unique_id;

// ============================================================================
// 只读快照
// ============================================================================

/// 两个集合的不可变快照，所有查询与统计都定义在快照上
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub test_cases: Vec<TestCase>,
}

impl Snapshot {
    pub fn get_project_by_id(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn get_test_case_by_id(&self, id: &str) -> Option<&TestCase> {
        self.test_cases.iter().find(|t| t.id == id)
    }

    /// 某项目下的用例，保持集合顺序
    pub fn get_test_cases_by_project_id(&self, project_id: &str) -> Vec<TestCase> {
        stats::test_cases_for_project(&self.test_cases, project_id)
            .cloned()
            .collect()
    }

    pub fn get_projects_with_stats(&self) -> Vec<ProjectWithStats> {
        stats::projects_with_stats(&self.projects, &self.test_cases)
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        stats::dashboard_stats(&self.projects, &self.test_cases)
    }

    pub fn recent_test_cases(&self, limit: usize) -> Vec<TestCase> {
        stats::recent_test_cases(&self.test_cases, limit)
    }

    pub fn filter_test_cases(&self, project_id: &str, filter: &TestCaseFilter) -> Vec<TestCase> {
        stats::filter_test_cases(&self.test_cases, project_id, filter)
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct Store {
    kv: Box<dyn KvStore>,
    clock: Box<dyn Clock>,
    data: Snapshot,
}

impl Store {
    /// 从持久化存储加载两个集合并构造 Store
    ///
    /// 缺失或损坏的集合按空处理；已加载用例的状态会按输出重新推导。
    pub fn open(kv: Box<dyn KvStore>) -> Self {
        Self::open_with_clock(kv, Box::new(SystemClock))
    }

    /// 使用指定时钟构造 Store
    pub fn open_with_clock(kv: Box<dyn KvStore>, clock: Box<dyn Clock>) -> Self {
        let projects: Vec<Project> = load_collection(kv.as_ref(), PROJECTS_KEY);
        let mut test_cases: Vec<TestCase> = load_collection(kv.as_ref(), TEST_CASES_KEY);
        for test_case in &mut test_cases {
            test_case.rederive_status();
        }

        log::info!(
            "Store 已加载：{} 个项目，{} 个测试用例",
            projects.len(),
            test_cases.len()
        );

        Store {
            kv,
            clock,
            data: Snapshot {
                projects,
                test_cases,
            },
        }
    }

    fn now(&self) -> AppResult<String> {
        format_timestamp(self.clock.now())
    }

    // ========================================================================
    // 查询
    // ========================================================================

    pub fn projects(&self) -> &[Project] {
        &self.data.projects
    }

    pub fn test_cases(&self) -> &[TestCase] {
        &self.data.test_cases
    }

    /// 复制一份当前快照
    pub fn snapshot(&self) -> Snapshot {
        self.data.clone()
    }

    pub fn get_project_by_id(&self, id: &str) -> Option<&Project> {
        self.data.get_project_by_id(id)
    }

    pub fn get_test_case_by_id(&self, id: &str) -> Option<&TestCase> {
        self.data.get_test_case_by_id(id)
    }

    pub fn get_test_cases_by_project_id(&self, project_id: &str) -> Vec<TestCase> {
        self.data.get_test_cases_by_project_id(project_id)
    }

    pub fn get_projects_with_stats(&self) -> Vec<ProjectWithStats> {
        self.data.get_projects_with_stats()
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        self.data.dashboard_stats()
    }

    pub fn recent_test_cases(&self, limit: usize) -> Vec<TestCase> {
        self.data.recent_test_cases(limit)
    }

    pub fn filter_test_cases(&self, project_id: &str, filter: &TestCaseFilter) -> Vec<TestCase> {
        self.data.filter_test_cases(project_id, filter)
    }

    // ========================================================================
    // 项目变更
    // ========================================================================

    /// 创建项目：生成 ID 与创建时间，追加到集合末尾
    pub fn add_project(&mut self, name: &str, description: &str) -> AppResult<Project> {
        let id = unique_id(|candidate| self.data.projects.iter().any(|p| p.id == candidate));
        let project = Project {
            id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: self.now()?,
        };

        let mut projects = self.data.projects.clone();
        projects.push(project.clone());
        save_collection(self.kv.as_mut(), PROJECTS_KEY, &projects)?;
        self.data.projects = projects;

        log::info!("已创建项目 {}（{}）", project.name, project.id);
        Ok(project)
    }

    /// 更新项目：按 ID 整体替换，created_at 保留原值
    pub fn update_project(&mut self, project: Project) -> AppResult<()> {
        let index = self
            .data
            .projects
            .iter()
            .position(|p| p.id == project.id)
            .ok_or_else(|| AppError::project_not_found(&project.id))?;

        let mut projects = self.data.projects.clone();
        let created_at = projects[index].created_at.clone();
        projects[index] = Project {
            created_at,
            ..project
        };
        save_collection(self.kv.as_mut(), PROJECTS_KEY, &projects)?;
        self.data.projects = projects;

        Ok(())
    }

    /// 删除项目，并级联删除其下所有用例
    ///
    /// 两个集合在一次原子写入中保存：都成功或都不生效。
    pub fn delete_project(&mut self, id: &str) -> AppResult<()> {
        if self.get_project_by_id(id).is_none() {
            return Err(AppError::project_not_found(id));
        }

        let projects: Vec<Project> = self
            .data
            .projects
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        let test_cases: Vec<TestCase> = self
            .data
            .test_cases
            .iter()
            .filter(|t| t.project_id != id)
            .cloned()
            .collect();
        let removed_cases = self.data.test_cases.len() - test_cases.len();

        self.kv.put_many(&[
            (PROJECTS_KEY, encode_collection(&projects)?),
            (TEST_CASES_KEY, encode_collection(&test_cases)?),
        ])?;
        self.data.projects = projects;
        self.data.test_cases = test_cases;

        log::info!("已删除项目 {}，级联删除 {} 个测试用例", id, removed_cases);
        Ok(())
    }

    // ========================================================================
    // 测试用例变更
    // ========================================================================

    /// 创建测试用例：推导状态，created_at = updated_at = 当前时间
    ///
    /// 不校验 projectId 是否指向存在的项目；孤立用例不会出现在任何项目查询中。
    pub fn add_test_case(&mut self, data: NewTestCase) -> AppResult<TestCase> {
        if self.get_project_by_id(&data.project_id).is_none() {
            log::warn!("测试用例引用了不存在的项目：{}", data.project_id);
        }

        let id = unique_id(|candidate| self.data.test_cases.iter().any(|t| t.id == candidate));
        let test_case = TestCase::from_new(id, data, self.now()?);

        let mut test_cases = self.data.test_cases.clone();
        test_cases.push(test_case.clone());
        save_collection(self.kv.as_mut(), TEST_CASES_KEY, &test_cases)?;
        self.data.test_cases = test_cases;

        log::debug!(
            "已创建测试用例 {}，状态 {}",
            test_case.id,
            test_case.status().as_str()
        );
        Ok(test_case)
    }

    /// 更新测试用例：重新推导状态并刷新 updated_at，返回保存后的用例
    ///
    /// 调用方传入的状态被忽略；id、projectId 与 createdAt 保留存储中的值。
    pub fn update_test_case(&mut self, test_case: TestCase) -> AppResult<TestCase> {
        let index = self
            .data
            .test_cases
            .iter()
            .position(|t| t.id == test_case.id)
            .ok_or_else(|| AppError::test_case_not_found(&test_case.id))?;

        let stored = &self.data.test_cases[index];
        let updated_at = format_timestamp(strictly_after(self.clock.now(), &stored.updated_at))?;
        let mut updated = test_case;
        updated.project_id = stored.project_id.clone();
        updated.created_at = stored.created_at.clone();
        updated.updated_at = updated_at;
        updated.rederive_status();

        let mut test_cases = self.data.test_cases.clone();
        test_cases[index] = updated.clone();
        save_collection(self.kv.as_mut(), TEST_CASES_KEY, &test_cases)?;
        self.data.test_cases = test_cases;

        Ok(updated)
    }

    /// 删除测试用例
    pub fn delete_test_case(&mut self, id: &str) -> AppResult<()> {
        if self.get_test_case_by_id(id).is_none() {
            return Err(AppError::test_case_not_found(id));
        }

        let test_cases: Vec<TestCase> = self
            .data
            .test_cases
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();
        save_collection(self.kv.as_mut(), TEST_CASES_KEY, &test_cases)?;
        self.data.test_cases = test_cases;

        Ok(())
    }

    // ========================================================================
    // 生命周期
    // ========================================================================

    /// 将两个集合整体写回存储
    pub fn flush(&mut self) -> AppResult<()> {
        self.kv.put_many(&[
            (PROJECTS_KEY, encode_collection(&self.data.projects)?),
            (TEST_CASES_KEY, encode_collection(&self.data.test_cases)?),
        ])
    }

    /// 关闭 Store：先落盘再释放
    pub fn close(mut self) -> AppResult<()> {
        self.flush()?;
        log::info!("Store 已关闭");
        Ok(())
    }
}

// ============================================================================
// 单元测试
// ============================================================================
