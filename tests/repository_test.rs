//! 需要真实 PostgreSQL：`DATABASE_URL=... cargo test -- --ignored`

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use smart_lab::{
    AppState,
    config::Config,
    database::Patch,
    routes::{
        self,
        auth::{NewUser, User},
        class::{Class, CreateClassRequest},
        course::{Course, CreateCourseRequest, UpdateCourseRequest},
        course_offering::{CourseOffering, CreateOfferingRequest},
        equipment::{CreateEquipmentRequest, Equipment, EquipmentFilter},
        lab::{CreateLabRequest, Lab},
        teacher::{CreateTeacherRequest, Teacher},
    },
    utils::{generate_token, hash_password},
};
use sqlx::PgPool;
use tower::ServiceExt;

fn config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some("repository-test-secret".to_string()),
        _ => None,
    })
    .unwrap()
}

fn app(pool: &PgPool) -> Router {
    routes::router(AppState {
        pool: pool.clone(),
        config: config(),
    })
}

async fn token_for(pool: &PgPool, username: &str, role: &str) -> String {
    let id = User::create(
        pool,
        NewUser {
            username: username.to_string(),
            password_hash: hash_password("secret123").unwrap(),
            name: username.to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap();
    generate_token(id, username, role, &config()).unwrap().0
}

async fn call(app: Router, method: Method, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar(&sql).fetch_one(pool).await.unwrap()
}

fn intro_course(code: &str) -> CreateCourseRequest {
    CreateCourseRequest {
        code: code.to_string(),
        name: "Intro".to_string(),
        credit: 3,
        total_hours: 48,
        department: "CS".to_string(),
        course_type: None,
        description: None,
    }
}

fn lab(name: &str) -> CreateLabRequest {
    CreateLabRequest {
        code: Some("L-101".to_string()),
        name: name.to_string(),
        building_id: 1,
        building_name: Some("实验楼".to_string()),
        room_number: Some("101".to_string()),
        room_capacity: None,
        lab_type: None,
        equipment_count: None,
        status: None,
        description: None,
    }
}

fn equipment(lab_id: i64, name: &str, category: &str, status: &str) -> CreateEquipmentRequest {
    CreateEquipmentRequest {
        lab_id,
        name: name.to_string(),
        model: None,
        serial_number: None,
        category: Some(category.to_string()),
        manufacturer: None,
        purchase_date: None,
        purchase_price: Some(1200.0),
        quantity: None,
        students_per_group: None,
        status: Some(status.to_string()),
        description: None,
        specifications: None,
    }
}

fn class_02() -> CreateClassRequest {
    CreateClassRequest {
        name: "计科2102".to_string(),
        department: "信息学院".to_string(),
        major: "计算机科学".to_string(),
        grade: "2021".to_string(),
        class_number: "02".to_string(),
        student_count: 32,
        head_teacher: None,
        description: None,
        status: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn course_read_after_write(pool: PgPool) {
    let id = Course::create(&pool, intro_course("CS101")).await.unwrap();
    let course = Course::find_by_id(&pool, id).await.unwrap().unwrap();

    assert_eq!(course.code, "CS101");
    assert_eq!(course.name, "Intro");
    assert_eq!(course.credit, 3);
    assert_eq!(course.total_hours, 48);
    assert_eq!(course.department.as_deref(), Some("CS"));
    assert_eq!(course.course_type, "mixed");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn empty_update_is_a_no_op(pool: PgPool) {
    let id = Course::create(&pool, intro_course("CS102")).await.unwrap();

    let updated = Course::update(&pool, id, UpdateCourseRequest::default())
        .await
        .unwrap();
    assert!(!updated);

    let course = Course::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(course.name, "Intro");

    let renamed = UpdateCourseRequest {
        name: Patch::Value("Advanced".to_string()),
        description: Patch::Null,
        ..Default::default()
    };
    assert!(Course::update(&pool, id, renamed).await.unwrap());
    let course = Course::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(course.name, "Advanced");
    assert_eq!(course.code, "CS102");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn delete_reports_whether_a_row_went_away(pool: PgPool) {
    assert!(!Course::delete(&pool, 9_999).await.unwrap());

    let id = Course::create(&pool, intro_course("CS103")).await.unwrap();
    assert!(Course::delete(&pool, id).await.unwrap());
    assert!(Course::find_by_id(&pool, id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_course_code_conflicts(pool: PgPool) {
    let token = token_for(&pool, "teacher01", "teacher").await;
    let body = json!({
        "code": "CS101",
        "name": "Intro",
        "credit": 3,
        "total_hours": 48,
        "department": "CS"
    });

    let (status, first) = call(app(&pool), Method::POST, "/api/courses", &token, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["type"], "mixed");
    assert!(first["data"]["id"].as_i64().unwrap() > 0);

    let (status, second) = call(app(&pool), Method::POST, "/api/courses", &token, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["message"], "课程代码已存在");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_username_conflicts(pool: PgPool) {
    let admin = token_for(&pool, "root01", "admin").await;
    let body = json!({
        "username": "zhangsan",
        "password": "secret123",
        "name": "张三",
        "role": "student"
    });

    let (status, first) = call(app(&pool), Method::POST, "/api/auth/users", &admin, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(first["data"].get("password_hash").is_none());
    let before = count(&pool, "users").await;

    let (status, second) = call(app(&pool), Method::POST, "/api/auth/users", &admin, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["message"], "用户名已存在");
    assert_eq!(count(&pool, "users").await, before);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_teacher_id_conflicts(pool: PgPool) {
    let admin = token_for(&pool, "root01", "admin").await;
    let body = json!({"teacher_id": "T001", "name": "张老师", "department": "物理系"});

    let (status, _) = call(app(&pool), Method::POST, "/api/teachers", &admin, body).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = call(
        app(&pool),
        Method::POST,
        "/api/teachers",
        &admin,
        json!({"teacher_id": "T001", "name": "王老师"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["message"], "教师工号已存在");
    assert_eq!(count(&pool, "teachers").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_lab_name_conflicts_on_create_and_rename(pool: PgPool) {
    let token = token_for(&pool, "teacher01", "teacher").await;
    let body = json!({"name": "物理实验室A", "building_id": 1});

    let (status, _) = call(app(&pool), Method::POST, "/api/labs", &token, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = call(app(&pool), Method::POST, "/api/labs", &token, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["message"], "实验室名称已存在");
    assert_eq!(count(&pool, "labs").await, 1);

    let other = Lab::create(&pool, lab("物理实验室B")).await.unwrap();
    let uri = format!("/api/labs/{}", other);
    let (status, body) = call(app(&pool), Method::PUT, &uri, &token, json!({"name": "物理实验室A"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "实验室名称已存在");

    let unchanged = Lab::find_by_id(&pool, other).await.unwrap().unwrap();
    assert_eq!(unchanged.name, "物理实验室B");
    assert_eq!(count(&pool, "labs").await, 2);

    // 保持原名不算冲突
    let (status, _) = call(app(&pool), Method::PUT, &uri, &token, json!({"name": "物理实验室B"})).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_serial_number_conflicts(pool: PgPool) {
    let token = token_for(&pool, "teacher01", "teacher").await;
    let lab_id = Lab::create(&pool, lab("电子实验室")).await.unwrap();
    let body = json!({"name": "示波器", "lab_id": lab_id, "serial_number": "SN-001"});

    let (status, created) = call(app(&pool), Method::POST, "/api/equipment", &token, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["lab_name"], "电子实验室");

    let (status, second) = call(app(&pool), Method::POST, "/api/equipment", &token, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["message"], "设备序列号已存在");
    assert_eq!(count(&pool, "equipment").await, 1);

    let other = Equipment::create(&pool, equipment(lab_id, "万用表", "电子", "available"))
        .await
        .unwrap();
    let uri = format!("/api/equipment/{}", other);
    let (status, body) = call(app(&pool), Method::PUT, &uri, &token, json!({"serial_number": "SN-001"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "设备序列号已存在");
    let unchanged = Equipment::find_by_id(&pool, other).await.unwrap().unwrap();
    assert_eq!(unchanged.serial_number, None);

    let (status, body) = call(
        app(&pool),
        Method::POST,
        "/api/equipment",
        &token,
        json!({"name": "天平", "lab_id": 9_999}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "实验室不存在");
    assert_eq!(count(&pool, "equipment").await, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_class_key_conflicts(pool: PgPool) {
    let token = token_for(&pool, "teacher01", "teacher").await;
    let body = json!({
        "name": "计科2101",
        "department": "信息学院",
        "major": "计算机科学",
        "grade": "2021",
        "class_number": "01",
        "student_count": 30
    });

    let (status, _) = call(app(&pool), Method::POST, "/api/classes", &token, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    // 名称不同但专业、年级、班号相同
    let mut renamed = body;
    renamed["name"] = json!("计科一班");
    let (status, second) = call(app(&pool), Method::POST, "/api/classes", &token, renamed).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["message"], "该班级已存在");
    assert_eq!(count(&pool, "classes").await, 1);

    let other = Class::create(&pool, class_02()).await.unwrap();
    let uri = format!("/api/classes/{}", other);
    let (status, body) = call(app(&pool), Method::PUT, &uri, &token, json!({"class_number": "01"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "该班级已存在");
    let unchanged = Class::find_by_id(&pool, other).await.unwrap().unwrap();
    assert_eq!(unchanged.class_number, "02");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn lab_and_equipment_read_after_write(pool: PgPool) {
    let lab_id = Lab::create(&pool, lab("光学实验室")).await.unwrap();
    let stored = Lab::find_by_id(&pool, lab_id).await.unwrap().unwrap();
    assert_eq!(stored.name, "光学实验室");
    assert_eq!(stored.code.as_deref(), Some("L-101"));
    assert_eq!(stored.building_id, 1);
    assert_eq!(stored.room_capacity, 100);
    assert_eq!(stored.lab_type, "general");
    assert_eq!(stored.equipment_count, 0);
    assert_eq!(stored.status, "available");

    let mut req = equipment(lab_id, "分光计", "光学", "in_use");
    req.serial_number = Some("SN-OPT-1".to_string());
    let id = Equipment::create(&pool, req).await.unwrap();
    let stored = Equipment::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(stored.lab_id, lab_id);
    assert_eq!(stored.name, "分光计");
    assert_eq!(stored.serial_number.as_deref(), Some("SN-OPT-1"));
    assert_eq!(stored.category.as_deref(), Some("光学"));
    assert_eq!(stored.purchase_price, Some(1200.0));
    assert_eq!(stored.quantity, 1);
    assert_eq!(stored.students_per_group, 1);
    assert_eq!(stored.status, "in_use");
    assert_eq!(stored.lab_name.as_deref(), Some("光学实验室"));
    assert_eq!(stored.lab_code.as_deref(), Some("L-101"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn class_teacher_and_offering_read_after_write(pool: PgPool) {
    let class_id = Class::create(&pool, class_02()).await.unwrap();
    let class = Class::find_by_id(&pool, class_id).await.unwrap().unwrap();
    assert_eq!(class.name, "计科2102");
    assert_eq!(class.major, "计算机科学");
    assert_eq!(class.grade, "2021");
    assert_eq!(class.class_number, "02");
    assert_eq!(class.student_count, 32);
    assert_eq!(class.status, "active");

    let teacher_id = Teacher::create(
        &pool,
        CreateTeacherRequest {
            teacher_id: "T100".to_string(),
            name: "赵老师".to_string(),
            department: Some("信息学院".to_string()),
            title: Some("副教授".to_string()),
        },
    )
    .await
    .unwrap();
    let teacher = Teacher::find_by_id(&pool, teacher_id).await.unwrap().unwrap();
    assert_eq!(teacher.teacher_id, "T100");
    assert_eq!(teacher.name, "赵老师");
    assert_eq!(teacher.title.as_deref(), Some("副教授"));

    let course_id = Course::create(&pool, intro_course("CS401")).await.unwrap();
    let offering_id = CourseOffering::create(
        &pool,
        CreateOfferingRequest {
            course_id,
            teacher_id,
            equipment_id: None,
            semester: "fall".to_string(),
            academic_year: "2025-2026".to_string(),
            max_students: 45,
            lab_hours: Some(16),
            theory_hours: None,
            description: None,
            status: None,
        },
    )
    .await
    .unwrap();
    let offering = CourseOffering::find_by_id(&pool, offering_id).await.unwrap().unwrap();
    assert_eq!(offering.course_id, course_id);
    assert_eq!(offering.teacher_id, teacher_id);
    assert_eq!(offering.semester, "fall");
    assert_eq!(offering.academic_year, "2025-2026");
    assert_eq!(offering.max_students, 45);
    assert_eq!(offering.lab_hours, 16);
    assert_eq!(offering.theory_hours, 0);
    assert_eq!(offering.status, "active");
    assert_eq!(offering.course_code.as_deref(), Some("CS401"));
    assert_eq!(offering.teacher_name.as_deref(), Some("赵老师"));
    assert_eq!(offering.equipment_name, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn equipment_filters_combine_with_and(pool: PgPool) {
    let lab_a = Lab::create(&pool, lab("物理实验室A")).await.unwrap();
    let lab_b = Lab::create(&pool, lab("物理实验室B")).await.unwrap();

    for req in [
        equipment(lab_a, "示波器", "电子", "available"),
        equipment(lab_a, "万用表", "电子", "maintenance"),
        equipment(lab_a, "天平", "力学", "available"),
        equipment(lab_b, "信号源", "电子", "available"),
    ] {
        Equipment::create(&pool, req).await.unwrap();
    }

    let available = Equipment::list(
        &pool,
        EquipmentFilter {
            status: Some("available".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(available.len(), 3);
    assert!(available.iter().all(|e| e.status == "available"));

    let narrowed = Equipment::list(
        &pool,
        EquipmentFilter {
            lab_id: Some(lab_a),
            category: Some("电子".to_string()),
            status: Some("available".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].name, "示波器");
    assert_eq!(narrowed[0].lab_name.as_deref(), Some("物理实验室A"));

    let stats = Equipment::stats(&pool).await.unwrap();
    assert_eq!(stats.total_equipment, 4);
    assert_eq!(stats.available_count, 3);
    assert_eq!(stats.maintenance_count, 1);
    assert_eq!(stats.total_quantity, 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn lab_with_equipment_cannot_be_deleted(pool: PgPool) {
    let token = token_for(&pool, "teacher01", "teacher").await;
    let lab_id = Lab::create(&pool, lab("化学实验室")).await.unwrap();
    Equipment::create(&pool, equipment(lab_id, "滴定管", "化学", "available"))
        .await
        .unwrap();

    let uri = format!("/api/labs/{}", lab_id);
    let (status, body) = call(app(&pool), Method::DELETE, &uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "数据关联错误");
    assert!(Lab::find_by_id(&pool, lab_id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn admin_routes_reject_other_roles(pool: PgPool) {
    let teacher = token_for(&pool, "teacher01", "teacher").await;
    let (status, body) = call(app(&pool), Method::GET, "/api/auth/users", &teacher, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "需要管理员权限");

    let student = token_for(&pool, "student01", "student").await;
    let (status, _) = call(
        app(&pool),
        Method::POST,
        "/api/teachers",
        &student,
        json!({"teacher_id": "T001", "name": "张老师"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token_for(&pool, "root01", "admin").await;
    let (status, body) = call(app(&pool), Method::GET, "/api/auth/users?limit=2", &admin, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["limit"], 2);
    assert_eq!(body["data"]["totalPages"], 2);
    assert!(body["data"]["data"][0].get("password_hash").is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn admin_cannot_delete_itself(pool: PgPool) {
    let admin = token_for(&pool, "root01", "admin").await;
    let me = User::find_by_username(&pool, "root01").await.unwrap().unwrap();

    let uri = format!("/api/auth/users/{}", me.id);
    let (status, body) = call(app(&pool), Method::DELETE, &uri, &admin, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "不能删除当前登录用户");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_offering_creation_admits_exactly_one(pool: PgPool) {
    let token = token_for(&pool, "teacher01", "teacher").await;
    let course_id = Course::create(&pool, intro_course("CS201")).await.unwrap();
    let teacher_id: i64 = sqlx::query_scalar(
        "INSERT INTO teachers (teacher_id, name) VALUES ('T001', '张老师') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let body = json!({
        "course_id": course_id,
        "teacher_id": teacher_id,
        "semester": "fall",
        "academic_year": "2024-2025",
        "max_students": 40
    });

    let (a, b) = tokio::join!(
        call(app(&pool), Method::POST, "/api/course-offerings", &token, body.clone()),
        call(app(&pool), Method::POST, "/api/course-offerings", &token, body.clone()),
    );
    let mut statuses = vec![a.0.as_u16(), b.0.as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 409]);

    let loser = if a.0 == StatusCode::CONFLICT { a.1 } else { b.1 };
    assert_eq!(loser["message"], "该课程在当前学期已开设");

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM course_offerings WHERE course_id = $1 AND status = 'active'",
    )
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active, 1);

    // 非有效状态的开课不占用学期
    let mut inactive = body;
    inactive["status"] = json!("inactive");
    let (status, _) = call(app(&pool), Method::POST, "/api/course-offerings", &token, inactive).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn offering_class_association_lifecycle(pool: PgPool) {
    let token = token_for(&pool, "teacher01", "teacher").await;
    let course_id = Course::create(&pool, intro_course("CS301")).await.unwrap();
    let teacher_id: i64 = sqlx::query_scalar(
        "INSERT INTO teachers (teacher_id, name) VALUES ('T002', '李老师') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let class_id: i64 = sqlx::query_scalar(
        "INSERT INTO classes (name, department, major, grade, class_number, student_count) \
         VALUES ('计科2101', '信息学院', '计算机科学', '2021', '01', 30) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let (status, created) = call(
        app(&pool),
        Method::POST,
        "/api/course-offerings",
        &token,
        json!({
            "course_id": course_id,
            "teacher_id": teacher_id,
            "semester": "spring",
            "academic_year": "2025-2026",
            "max_students": 60
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["course_code"], "CS301");
    assert_eq!(created["data"]["teacher_name"], "李老师");
    let offering_id = created["data"]["id"].as_i64().unwrap();

    let classes_uri = format!("/api/course-offerings/{}/classes", offering_id);
    let (status, added) = call(app(&pool), Method::POST, &classes_uri, &token, json!({"class_id": class_id})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(added["data"]["id"].as_i64().is_some());

    let (status, body) = call(app(&pool), Method::POST, &classes_uri, &token, json!({"class_id": class_id})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "该班级已添加到此开课信息");

    let (status, body) = call(app(&pool), Method::POST, &classes_uri, &token, json!({"class_id": 9_999})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "班级不存在");

    let (status, listed) = call(app(&pool), Method::GET, &classes_uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);

    let remove_uri = format!("{}/{}", classes_uri, class_id);
    let (status, _) = call(app(&pool), Method::DELETE, &remove_uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(app(&pool), Method::DELETE, &remove_uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "该班级未添加到此开课信息");

    let (status, body) = call(
        app(&pool),
        Method::POST,
        "/api/course-offerings/9999/classes",
        &token,
        json!({"class_id": class_id}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "开课信息不存在");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn admin_bootstrap_runs_once(pool: PgPool) {
    let admin = || NewUser {
        username: "admin".to_string(),
        password_hash: hash_password("admin123").unwrap(),
        name: "系统管理员".to_string(),
        role: "admin".to_string(),
    };

    assert!(User::bootstrap_admin(&pool, admin()).await.unwrap().is_some());
    assert!(User::bootstrap_admin(&pool, admin()).await.unwrap().is_none());

    let stored = User::find_by_username(&pool, "admin").await.unwrap().unwrap();
    assert_eq!(stored.role, "admin");
}
