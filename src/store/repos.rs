//! Typed repositories, one per collection. Handlers receive a [`Repos`]
//! bundle via app data instead of touching files themselves. Uniqueness
//! checks run inside the store's read-modify-write cycle, so a rejected
//! insert never writes anything.

use std::sync::Arc;

use derive_more::Display;

use crate::model::{
    Admin, AttendanceSession, Class, LifecycleStatus, Student, Teacher,
};
use super::{RecordKind, RecordStore};

#[derive(Debug, Display, PartialEq)]
pub enum RepoError {
    #[display(fmt = "duplicate {}", _0)]
    Duplicate(&'static str),
    #[display(fmt = "record not found")]
    NotFound,
    #[display(fmt = "storage failure: {}", _0)]
    Storage(String),
}

impl std::error::Error for RepoError {}

fn flatten<R>(outcome: anyhow::Result<Result<R, RepoError>>) -> Result<R, RepoError> {
    match outcome {
        Ok(inner) => inner,
        Err(err) => Err(RepoError::Storage(err.to_string())),
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[derive(Clone)]
pub struct Repos {
    store: Arc<RecordStore>,
}

impl Repos {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn admin(&self) -> AdminRepo {
        AdminRepo { store: Arc::clone(&self.store) }
    }

    pub fn students(&self) -> StudentRepo {
        StudentRepo { store: Arc::clone(&self.store) }
    }

    pub fn teachers(&self) -> TeacherRepo {
        TeacherRepo { store: Arc::clone(&self.store) }
    }

    pub fn classes(&self) -> ClassRepo {
        ClassRepo { store: Arc::clone(&self.store) }
    }

    pub fn attendance(&self) -> AttendanceRepo {
        AttendanceRepo { store: Arc::clone(&self.store) }
    }
}

pub struct AdminRepo {
    store: Arc<RecordStore>,
}

impl AdminRepo {
    /// There is at most one admin record.
    pub fn get(&self) -> Option<Admin> {
        self.store.load(RecordKind::Admin).into_iter().next()
    }

    pub fn create(&self, admin: Admin) -> Result<Admin, RepoError> {
        flatten(self.store.try_update(RecordKind::Admin, |records: &mut Vec<Admin>| {
            if !records.is_empty() {
                return Err(RepoError::Duplicate("admin account"));
            }
            records.push(admin.clone());
            Ok(admin)
        }))
    }

    pub fn update(&self, apply: impl FnOnce(&mut Admin)) -> Result<Admin, RepoError> {
        flatten(self.store.try_update(RecordKind::Admin, |records: &mut Vec<Admin>| {
            let record = records.first_mut().ok_or(RepoError::NotFound)?;
            apply(record);
            Ok(record.clone())
        }))
    }
}

pub struct StudentRepo {
    store: Arc<RecordStore>,
}

impl StudentRepo {
    pub fn list(&self) -> Vec<Student> {
        self.store.load(RecordKind::Students)
    }

    pub fn get(&self, id: &str) -> Option<Student> {
        self.list().into_iter().find(|s| s.id == id)
    }

    pub fn find_by_index(&self, index_number: &str) -> Option<Student> {
        self.list()
            .into_iter()
            .find(|s| eq_ignore_case(&s.index_number, index_number))
    }

    /// Login lookup: index number or email, exact match.
    pub fn find_by_login(&self, identifier: &str) -> Option<Student> {
        self.list()
            .into_iter()
            .find(|s| s.index_number == identifier || s.email == identifier)
    }

    pub fn insert(&self, student: Student) -> Result<Student, RepoError> {
        flatten(self.store.try_update(RecordKind::Students, |records: &mut Vec<Student>| {
            let taken = records.iter().any(|s| {
                eq_ignore_case(&s.index_number, &student.index_number)
                    || eq_ignore_case(&s.email, &student.email)
            });
            if taken {
                return Err(RepoError::Duplicate("index number or email"));
            }
            records.push(student.clone());
            Ok(student)
        }))
    }

    pub fn update(&self, id: &str, apply: impl FnOnce(&mut Student)) -> Result<Student, RepoError> {
        flatten(self.store.try_update(RecordKind::Students, |records: &mut Vec<Student>| {
            let record = records
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(RepoError::NotFound)?;
            apply(record);
            Ok(record.clone())
        }))
    }

    pub fn remove(&self, id: &str) -> Result<Student, RepoError> {
        flatten(self.store.try_update(RecordKind::Students, |records: &mut Vec<Student>| {
            let position = records
                .iter()
                .position(|s| s.id == id)
                .ok_or(RepoError::NotFound)?;
            Ok(records.remove(position))
        }))
    }
}

pub struct TeacherRepo {
    store: Arc<RecordStore>,
}

impl TeacherRepo {
    pub fn list(&self) -> Vec<Teacher> {
        self.store.load(RecordKind::Teachers)
    }

    pub fn approved(&self) -> Vec<Teacher> {
        self.list()
            .into_iter()
            .filter(|t| t.status == LifecycleStatus::Approved)
            .collect()
    }

    pub fn pending(&self) -> Vec<Teacher> {
        self.list()
            .into_iter()
            .filter(|t| t.status == LifecycleStatus::Pending)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Teacher> {
        self.list().into_iter().find(|t| t.id == id)
    }

    /// Login lookup: username or email, exact match.
    pub fn find_by_login(&self, identifier: &str) -> Option<Teacher> {
        self.list()
            .into_iter()
            .find(|t| t.username == identifier || t.email == identifier)
    }

    pub fn insert(&self, teacher: Teacher) -> Result<Teacher, RepoError> {
        flatten(self.store.try_update(RecordKind::Teachers, |records: &mut Vec<Teacher>| {
            let taken = records.iter().any(|t| {
                eq_ignore_case(&t.username, &teacher.username)
                    || eq_ignore_case(&t.email, &teacher.email)
            });
            if taken {
                return Err(RepoError::Duplicate("username or email"));
            }
            if records
                .iter()
                .any(|t| eq_ignore_case(&t.employee_id, &teacher.employee_id))
            {
                return Err(RepoError::Duplicate("employee id"));
            }
            records.push(teacher.clone());
            Ok(teacher)
        }))
    }

    pub fn update(&self, id: &str, apply: impl FnOnce(&mut Teacher)) -> Result<Teacher, RepoError> {
        flatten(self.store.try_update(RecordKind::Teachers, |records: &mut Vec<Teacher>| {
            let record = records
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(RepoError::NotFound)?;
            apply(record);
            Ok(record.clone())
        }))
    }

    /// `pending -> approved`. Terminal: there is no way back.
    pub fn approve(&self, id: &str) -> Result<Teacher, RepoError> {
        flatten(self.store.try_update(RecordKind::Teachers, |records: &mut Vec<Teacher>| {
            let record = records
                .iter_mut()
                .find(|t| t.id == id && t.status == LifecycleStatus::Pending)
                .ok_or(RepoError::NotFound)?;
            record.status = LifecycleStatus::Approved;
            Ok(record.clone())
        }))
    }

    /// Rejection deletes the record; the only way back is registering again.
    pub fn reject(&self, id: &str) -> Result<Teacher, RepoError> {
        flatten(self.store.try_update(RecordKind::Teachers, |records: &mut Vec<Teacher>| {
            let position = records
                .iter()
                .position(|t| t.id == id && t.status == LifecycleStatus::Pending)
                .ok_or(RepoError::NotFound)?;
            Ok(records.remove(position))
        }))
    }

    pub fn remove(&self, id: &str) -> Result<Teacher, RepoError> {
        flatten(self.store.try_update(RecordKind::Teachers, |records: &mut Vec<Teacher>| {
            let position = records
                .iter()
                .position(|t| t.id == id)
                .ok_or(RepoError::NotFound)?;
            Ok(records.remove(position))
        }))
    }
}

pub struct ClassRepo {
    store: Arc<RecordStore>,
}

impl ClassRepo {
    pub fn list(&self) -> Vec<Class> {
        self.store.load(RecordKind::Classes)
    }

    pub fn get(&self, id: &str) -> Option<Class> {
        self.list().into_iter().find(|c| c.id == id)
    }

    pub fn insert(&self, class: Class) -> Result<Class, RepoError> {
        flatten(self.store.try_update(RecordKind::Classes, |records: &mut Vec<Class>| {
            if records
                .iter()
                .any(|c| eq_ignore_case(&c.class_code, &class.class_code))
            {
                return Err(RepoError::Duplicate("class code"));
            }
            records.push(class.clone());
            Ok(class)
        }))
    }

    pub fn update(&self, id: &str, apply: impl FnOnce(&mut Class)) -> Result<Class, RepoError> {
        flatten(self.store.try_update(RecordKind::Classes, |records: &mut Vec<Class>| {
            let record = records
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(RepoError::NotFound)?;
            apply(record);
            Ok(record.clone())
        }))
    }

    pub fn remove(&self, id: &str) -> Result<Class, RepoError> {
        flatten(self.store.try_update(RecordKind::Classes, |records: &mut Vec<Class>| {
            let position = records
                .iter()
                .position(|c| c.id == id)
                .ok_or(RepoError::NotFound)?;
            Ok(records.remove(position))
        }))
    }
}

pub struct AttendanceRepo {
    store: Arc<RecordStore>,
}

impl AttendanceRepo {
    pub fn list(&self) -> Vec<AttendanceSession> {
        self.store.load(RecordKind::Attendance)
    }

    pub fn for_class(&self, class_id: &str) -> Vec<AttendanceSession> {
        self.list()
            .into_iter()
            .filter(|s| s.class_id == class_id)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<AttendanceSession> {
        self.list().into_iter().find(|s| s.id == id)
    }

    /// One session per class and date.
    pub fn insert(&self, session: AttendanceSession) -> Result<AttendanceSession, RepoError> {
        flatten(self.store.try_update(
            RecordKind::Attendance,
            |records: &mut Vec<AttendanceSession>| {
                if records
                    .iter()
                    .any(|s| s.class_id == session.class_id && s.date == session.date)
                {
                    return Err(RepoError::Duplicate("attendance session for this date"));
                }
                records.push(session.clone());
                Ok(session)
            },
        ))
    }

    /// Overwrites a stored session with an already-mutated copy.
    pub fn replace(&self, session: AttendanceSession) -> Result<AttendanceSession, RepoError> {
        let id = session.id.clone();
        self.update(&id, move |record| *record = session)
    }

    pub fn update(
        &self,
        id: &str,
        apply: impl FnOnce(&mut AttendanceSession),
    ) -> Result<AttendanceSession, RepoError> {
        flatten(self.store.try_update(
            RecordKind::Attendance,
            |records: &mut Vec<AttendanceSession>| {
                let record = records
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or(RepoError::NotFound)?;
                apply(record);
                Ok(record.clone())
            },
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::events::EventBus;
    use chrono::Utc;

    pub(crate) fn test_repos(dir: &tempfile::TempDir) -> Repos {
        let store = RecordStore::open(dir.path(), EventBus::new()).unwrap();
        Repos::new(Arc::new(store))
    }

    pub(crate) fn student(index_number: &str, name: &str) -> Student {
        Student {
            id: uuid::Uuid::new_v4().to_string(),
            index_number: index_number.to_string(),
            full_name: name.to_string(),
            email: format!("{}@university.edu", name.to_lowercase().replace(' ', ".")),
            phone: None,
            academic_level: "Level 100".to_string(),
            program_type: "regular".to_string(),
            password: "hash".to_string(),
            status: LifecycleStatus::Active,
            registration_date: Utc::now(),
            enrolled_classes: vec![],
            password_changed_at: None,
        }
    }

    pub(crate) fn teacher(username: &str, status: LifecycleStatus) -> Teacher {
        Teacher {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            full_name: format!("Dr {username}"),
            email: format!("{username}@university.edu"),
            phone: None,
            department: "Computer Science".to_string(),
            employee_id: format!("EMP-{username}"),
            password: "hash".to_string(),
            status,
            registration_date: Utc::now(),
            assigned_classes: vec![],
            password_changed_at: None,
        }
    }

    #[test]
    fn duplicate_index_number_is_rejected_and_existing_record_kept() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);

        repos.students().insert(student("CS/2024/001", "Alice Johnson")).unwrap();

        let outcome = repos.students().insert(student("cs/2024/001", "Impostor"));
        assert_eq!(outcome, Err(RepoError::Duplicate("index number or email")));

        let all = repos.students().list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].full_name, "Alice Johnson");
    }

    #[test]
    fn duplicate_employee_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);

        repos.teachers().insert(teacher("smith", LifecycleStatus::Approved)).unwrap();

        let mut clone = teacher("jones", LifecycleStatus::Pending);
        clone.employee_id = "EMP-smith".to_string();
        let outcome = repos.teachers().insert(clone);

        assert_eq!(outcome, Err(RepoError::Duplicate("employee id")));
        assert_eq!(repos.teachers().list().len(), 1);
    }

    #[test]
    fn approve_moves_pending_teacher_out_of_pending_view() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);

        let pending = repos
            .teachers()
            .insert(teacher("smith", LifecycleStatus::Pending))
            .unwrap();
        assert_eq!(repos.teachers().pending().len(), 1);

        let approved = repos.teachers().approve(&pending.id).unwrap();
        assert_eq!(approved.status, LifecycleStatus::Approved);
        assert!(repos.teachers().pending().is_empty());
        assert_eq!(repos.teachers().approved().len(), 1);
    }

    #[test]
    fn approve_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);

        let t = repos
            .teachers()
            .insert(teacher("smith", LifecycleStatus::Approved))
            .unwrap();

        assert_eq!(repos.teachers().approve(&t.id), Err(RepoError::NotFound));
        assert_eq!(repos.teachers().reject(&t.id), Err(RepoError::NotFound));
    }

    #[test]
    fn reject_removes_record_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);

        let pending = repos
            .teachers()
            .insert(teacher("smith", LifecycleStatus::Pending))
            .unwrap();

        repos.teachers().reject(&pending.id).unwrap();
        assert!(repos.teachers().list().is_empty());
    }

    #[test]
    fn second_admin_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);

        let admin = Admin {
            id: "a-1".to_string(),
            full_name: "Head of Department".to_string(),
            username: "admin".to_string(),
            email: "admin@university.edu".to_string(),
            password: "hash".to_string(),
            department: "Computer Science".to_string(),
            institution: "KSTU".to_string(),
            role: "super_admin".to_string(),
            created_at: Utc::now(),
            password_changed_at: None,
        };

        repos.admin().create(admin.clone()).unwrap();
        assert_eq!(
            repos.admin().create(admin),
            Err(RepoError::Duplicate("admin account"))
        );
    }
}
